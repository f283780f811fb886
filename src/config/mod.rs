//! Configuration management for `modelurl.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                         |
//! |-------------|-------------------------------------------------|
//! | `[[types]]` | Types allowed in macros and their URL accessor  |
//! | `[[views]]` | Views whose render context binds an object      |
//! | `[reverse]` | Live-dispatch whitelist and probing options     |
//! | `[serve]`   | Reference host HTTP server                      |
//! | `[site]`    | Reference host fixture                          |

mod error;
mod handle;
mod section;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use handle::{cfg, init_config};
pub use section::{ReverseConfig, ServeConfig, SiteSection, TypeMapping, ViewMapping};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::log;

/// Default config file name.
pub const CONFIG_FILE: &str = "modelurl.toml";

/// Root configuration structure representing modelurl.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelUrlConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub types: Vec<TypeMapping>,

    #[serde(default)]
    pub views: Vec<ViewMapping>,

    #[serde(default)]
    pub reverse: ReverseConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub site: SiteSection,
}

impl ModelUrlConfig {
    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let (config, _) = Self::parse_with_ignored(content)?;
        Ok(config)
    }

    /// Load configuration from a file, warning about unknown fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.config_path = path.to_path_buf();
        config.normalize();
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let mut config: Self =
            serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
                ignored.push(path.to_string());
            })?;
        config.normalize();
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Lowercase whitelists; they are compared case-insensitively.
    fn normalize(&mut self) {
        for scheme in &mut self.reverse.check_schemes {
            *scheme = scheme.to_lowercase();
        }
        for site in &mut self.reverse.check_sites {
            *site = site.to_lowercase();
        }
    }

    /// Resolve a config-relative path (e.g. the fixture) against the config directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        match self.config_path.parent() {
            Some(root) => root.join(path),
            None => path.as_ref().to_path_buf(),
        }
    }
}

/// Parse a config string for tests, panicking on errors.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ModelUrlConfig {
    ModelUrlConfig::from_str(content).expect("test config parses")
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert!(config.types.is_empty());
        assert!(config.views.is_empty());
        assert_eq!(config.reverse.check_schemes, vec!["http".to_string()]);
        assert!(config.reverse.check_sites.is_empty());
        assert!(!config.reverse.check_unregistered);
        assert!(config.reverse.send_query);
        assert_eq!(config.serve.port, 5277);
        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
    }

    #[test]
    fn test_types_and_views() {
        let config = test_parse_config(
            r#"
[[types]]
type = "example.models.Page"

[[types]]
model = "example.models.Item"
function = "my_url"

[[types]]
type = "example.models.Other"
accessor = ""

[[views]]
view = "example.admin.root"
disable = true

[[views]]
view = "example.views.page_by_id"
context = "page"
remove_query = true
"#,
        );
        assert_eq!(config.types.len(), 3);
        assert_eq!(config.types[0].accessor_name(), None);
        assert_eq!(config.types[1].type_ref, "example.models.Item");
        assert_eq!(config.types[1].accessor_name(), Some("my_url"));
        assert_eq!(config.types[2].accessor_name(), None);

        assert!(config.views[0].disabled);
        assert_eq!(config.views[0].context, None);
        assert_eq!(config.views[1].context.as_deref(), Some("page"));
        assert!(config.views[1].remove_query);
    }

    #[test]
    fn test_whitelists_are_lowercased() {
        let config = test_parse_config(
            "[reverse]\ncheck_schemes = [\"HTTP\", \"https\"]\ncheck_sites = [\"TestServer\"]",
        );
        assert_eq!(config.reverse.check_schemes, vec!["http", "https"]);
        assert_eq!(config.reverse.check_sites, vec!["testserver"]);
    }

    #[test]
    fn test_unknown_fields_are_collected() {
        let (_, ignored) =
            ModelUrlConfig::parse_with_ignored("[serve]\nport = 1\nwatch = true").unwrap();
        assert_eq!(ignored, vec!["serve.watch".to_string()]);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            ModelUrlConfig::from_str("[[types]]\ntype = 5"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[site]\nfixture = \"data.json\"\n").unwrap();

        let config = ModelUrlConfig::load(&path).unwrap();
        assert_eq!(config.config_path, path);
        assert_eq!(
            config.root_join(config.site.fixture.as_ref().unwrap()),
            dir.path().join("data.json")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = ModelUrlConfig::load(Path::new("/nonexistent/modelurl.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_sample_config_builds() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let config = ModelUrlConfig::load(&root.join(CONFIG_FILE)).unwrap();
        assert_eq!(config.types.len(), 2);
        assert_eq!(config.views.len(), 4);
        assert!(config.reverse.check_unregistered);
        assert!(config.root_join(config.site.fixture.as_ref().unwrap()).is_file());
    }
}
