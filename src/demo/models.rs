//! Example models and their fixture-backed store.

use std::any::Any;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::model::{Model, ModelType, Object, ObjectResolver, ObjectStore};

pub const PAGE: &str = "example.models.Page";
pub const ITEM: &str = "example.models.Item";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: u32,
    pub content: String,
}

impl Model for Page {
    fn type_ref(&self) -> &str {
        PAGE
    }

    fn primary_key(&self) -> String {
        self.id.to_string()
    }

    fn canonical_url(&self) -> String {
        format!("/page_by_id/{}", self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub barcode: String,
}

impl Item {
    pub fn my_url(&self) -> String {
        format!("/item_by_barcode/{}", self.barcode)
    }
}

impl Model for Item {
    fn type_ref(&self) -> &str {
        ITEM
    }

    fn primary_key(&self) -> String {
        self.id.to_string()
    }

    fn canonical_url(&self) -> String {
        format!("/item_by_id/{}", self.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// All example objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Fixture {
    /// Built-in data: pages 1 and 11, items `first` and `second`.
    pub fn example() -> Self {
        let page = |id, content: &str| Page {
            id,
            content: content.to_string(),
        };
        let item = |id, barcode: &str| Item {
            id,
            barcode: barcode.to_string(),
        };
        Self {
            pages: vec![page(1, "page"), page(11, "eleven")],
            items: vec![item(1, "first"), item(2, "second")],
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        serde_json::from_str(&content).map_err(|err| ConfigError::Fixture(path.to_path_buf(), err))
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        let id: u32 = id.parse().ok()?;
        self.pages.iter().find(|page| page.id == id)
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        let id: u32 = id.parse().ok()?;
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_by_barcode(&self, barcode: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.barcode == barcode)
    }
}

impl ObjectStore for Fixture {
    fn get_by_primary_key(&self, type_ref: &str, primary_key: &str) -> Option<Object> {
        match type_ref {
            PAGE => self
                .page(primary_key)
                .map(|page| Arc::new(page.clone()) as Object),
            ITEM => self
                .item(primary_key)
                .map(|item| Arc::new(item.clone()) as Object),
            _ => None,
        }
    }

    fn all(&self, type_ref: &str) -> Vec<Object> {
        match type_ref {
            PAGE => self
                .pages
                .iter()
                .map(|page| Arc::new(page.clone()) as Object)
                .collect(),
            ITEM => self
                .items
                .iter()
                .map(|item| Arc::new(item.clone()) as Object)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Model catalog over `store`: both types, plus `Item::my_url`.
pub fn catalog(store: Arc<Fixture>) -> ObjectResolver {
    ObjectResolver::new(store)
        .register(ModelType::of::<Page>(PAGE))
        .register(ModelType::of::<Item>(ITEM).accessor("my_url", Item::my_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objects() {
        let fixture = Fixture::example();
        assert_eq!(fixture.page("1").unwrap().canonical_url(), "/page_by_id/1");
        assert_eq!(fixture.item("1").unwrap().my_url(), "/item_by_barcode/first");
        assert_eq!(fixture.page("11").unwrap().content, "eleven");
        assert_eq!(fixture.item("2").unwrap().barcode, "second");
        assert!(fixture.page("string").is_none());
    }

    #[test]
    fn test_bundled_fixture_matches_example() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/example.json");
        assert_eq!(Fixture::load(&path).unwrap(), Fixture::example());
    }

    #[test]
    fn test_invalid_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"pages\": [{\"id\": \"x\"}]}").unwrap();
        assert!(matches!(Fixture::load(&path), Err(ConfigError::Fixture(..))));
    }
}
