//! Model objects that macros can point at.
//!
//! | Item          | Purpose                                            |
//! |---------------|----------------------------------------------------|
//! | `Model`       | Object capability: identity + canonical URL        |
//! | `ModelType`   | Per-type descriptor with its named accessor table  |
//! | `ObjectStore` | Backing store lookup (external collaborator)       |
//! | `resolver`    | Type path + primary key ⇄ live object              |

mod resolver;

pub use resolver::ObjectResolver;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// Accessor used when neither the token nor the type mapping names one.
pub const CANONICAL_ACCESSOR: &str = "canonical_url";

/// An object that can appear in a macro token.
pub trait Model: Any + Send + Sync {
    /// Dotted type path, e.g. `example.models.Page`.
    fn type_ref(&self) -> &str;

    /// Primary key in its textual form.
    fn primary_key(&self) -> String;

    /// Canonical URL of the object.
    fn canonical_url(&self) -> String;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a live object.
pub type Object = Arc<dyn Model>;

/// A named zero-argument URL accessor bound to a concrete type.
///
/// Returns `None` when handed an object of a different type.
pub type Accessor = Arc<dyn Fn(&dyn Model) -> Option<String> + Send + Sync>;

/// Descriptor of a model type: its path and the accessors it exposes.
#[derive(Clone)]
pub struct ModelType {
    type_ref: String,
    accessors: FxHashMap<String, Accessor>,
}

impl ModelType {
    /// Describe `M` under `type_ref`, exposing the canonical accessor.
    pub fn of<M: Model>(type_ref: impl Into<String>) -> Self {
        let canonical: Accessor = Arc::new(|object: &dyn Model| {
            object
                .as_any()
                .downcast_ref::<M>()
                .map(|model| model.canonical_url())
        });
        let mut accessors = FxHashMap::default();
        accessors.insert(CANONICAL_ACCESSOR.to_string(), canonical);
        Self {
            type_ref: type_ref.into(),
            accessors,
        }
    }

    /// Expose an additional named accessor.
    pub fn accessor<M: Model>(mut self, name: impl Into<String>, f: fn(&M) -> String) -> Self {
        let accessor: Accessor =
            Arc::new(move |object: &dyn Model| object.as_any().downcast_ref::<M>().map(f));
        self.accessors.insert(name.into(), accessor);
        self
    }

    #[inline]
    pub fn type_ref(&self) -> &str {
        &self.type_ref
    }

    /// Look up an accessor by name; `None` selects the canonical one.
    pub fn get_accessor(&self, name: Option<&str>) -> Option<&Accessor> {
        self.accessors.get(name.unwrap_or(CANONICAL_ACCESSOR))
    }

    /// Sorted accessor names, for diagnostics.
    pub fn accessor_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.accessors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("type_ref", &self.type_ref)
            .field("accessors", &self.accessor_names())
            .finish()
    }
}

/// Backing store for model objects.
pub trait ObjectStore: Send + Sync {
    /// Fetch one object, `None` if it does not exist.
    fn get_by_primary_key(&self, type_ref: &str, primary_key: &str) -> Option<Object>;

    /// Every live object of a type (used to build dictionary snapshots).
    fn all(&self, type_ref: &str) -> Vec<Object>;
}
