//! Object resolution: type path + primary key → live object, and back.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{Model, ModelType, Object, ObjectStore};
use crate::core::MacroToken;
use crate::error::ReplaceError;
use crate::utils::html::Markup;

/// Registry of model types in front of an object store.
///
/// Type paths are looked up in an explicit table filled at startup, so an
/// unknown path is a configuration error rather than a missing object.
pub struct ObjectResolver {
    types: FxHashMap<String, ModelType>,
    store: Arc<dyn ObjectStore>,
}

impl ObjectResolver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            types: FxHashMap::default(),
            store,
        }
    }

    /// Add a model type descriptor.
    pub fn register(mut self, model_type: ModelType) -> Self {
        self.types
            .insert(model_type.type_ref().to_string(), model_type);
        self
    }

    /// Descriptor for `type_ref`, if registered.
    #[inline]
    pub fn model_type(&self, type_ref: &str) -> Option<&ModelType> {
        self.types.get(type_ref)
    }

    /// All registered type paths, sorted.
    pub fn type_refs(&self) -> Vec<&str> {
        let mut refs: Vec<_> = self.types.keys().map(String::as_str).collect();
        refs.sort_unstable();
        refs
    }

    /// Locate the object behind `type_ref` / `primary_key`.
    pub fn resolve(&self, type_ref: &str, primary_key: &str) -> Result<Object, ReplaceError> {
        if !self.types.contains_key(type_ref) {
            return Err(ReplaceError::UnknownType(type_ref.to_string()));
        }
        self.store
            .get_by_primary_key(type_ref, primary_key)
            .ok_or_else(|| ReplaceError::ObjectNotFound {
                type_ref: type_ref.to_string(),
                primary_key: primary_key.to_string(),
            })
    }

    /// Token for `object`, accessor omitted.
    pub fn encode(object: &dyn Model) -> MacroToken {
        MacroToken::new(object.type_ref(), object.primary_key())
    }

    /// Call a named accessor on `object`; `None` selects the canonical one.
    pub fn invoke_accessor(
        &self,
        object: &dyn Model,
        accessor: Option<&str>,
    ) -> Result<String, ReplaceError> {
        let unknown = || ReplaceError::UnknownAccessor {
            type_ref: object.type_ref().to_string(),
            accessor: accessor
                .unwrap_or(super::CANONICAL_ACCESSOR)
                .to_string(),
        };
        let model_type = self
            .model_type(object.type_ref())
            .ok_or_else(|| ReplaceError::UnknownType(object.type_ref().to_string()))?;
        let call = model_type.get_accessor(accessor).ok_or_else(unknown)?;
        call(object).ok_or_else(unknown)
    }

    /// Every live object of a registered type.
    pub fn all(&self, type_ref: &str) -> Result<Vec<Object>, ReplaceError> {
        if !self.types.contains_key(type_ref) {
            return Err(ReplaceError::UnknownType(type_ref.to_string()));
        }
        Ok(self.store.all(type_ref))
    }

    /// URL of an object addressed directly by type, key and accessor.
    ///
    /// A missing object yields empty markup; an unknown type or accessor is an error.
    pub fn model_url(
        &self,
        type_ref: &str,
        primary_key: &str,
        accessor: Option<&str>,
    ) -> Result<Markup, ReplaceError> {
        match self.resolve(type_ref, primary_key) {
            Ok(object) => self
                .invoke_accessor(object.as_ref(), accessor)
                .map(Markup::trusted),
            Err(ReplaceError::ObjectNotFound { .. }) => Ok(Markup::default()),
            Err(e) => Err(e),
        }
    }
}
