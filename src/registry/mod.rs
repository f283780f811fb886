//! Type and view registries.
//!
//! Built once from `[[types]]` / `[[views]]` and validated against the model
//! catalog and the routing table, so that unknown types, unknown accessor
//! names and unknown views are rejected at startup instead of at call time.
//! Both registries are read-only afterwards and shared without locking.

use rustc_hash::FxHashMap;

use crate::config::{ConfigDiagnostics, ConfigError, ModelUrlConfig, TypeMapping, ViewMapping};
use crate::model::ObjectResolver;
use crate::site::{Router, ViewId};

/// A type allowed in macros, with its default accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub type_ref: String,
    /// `None` selects the canonical accessor.
    pub accessor: Option<String>,
}

/// Types that may appear in macro tokens.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: FxHashMap<String, TypeEntry>,
}

impl TypeRegistry {
    #[inline]
    pub fn get(&self, type_ref: &str) -> Option<&TypeEntry> {
        self.entries.get(type_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by type path.
    pub fn entries(&self) -> Vec<&TypeEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_unstable_by(|a, b| a.type_ref.cmp(&b.type_ref));
        entries
    }
}

/// How live dispatch treats a routed view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub view: ViewId,
    /// Context key the view binds its object under; `None` only when disabled.
    pub context: Option<String>,
    pub remove_query: bool,
    pub disabled: bool,
}

/// Views whose rendered object can be recovered by a probe.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    entries: FxHashMap<ViewId, ViewEntry>,
}

impl ViewRegistry {
    #[inline]
    pub fn get(&self, view: &ViewId) -> Option<&ViewEntry> {
        self.entries.get(view)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by view identity.
    pub fn entries(&self) -> Vec<&ViewEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_unstable_by(|a, b| a.view.cmp(&b.view));
        entries
    }
}

/// Both registries, loaded together.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub types: TypeRegistry,
    pub views: ViewRegistry,
}

impl Registry {
    /// Build and validate the registries, reporting every problem at once.
    pub fn load(
        config: &ModelUrlConfig,
        resolver: &ObjectResolver,
        router: &dyn Router,
    ) -> Result<Self, ConfigError> {
        let mut diags = ConfigDiagnostics::new();
        let types = load_types(&config.types, resolver, &mut diags);
        let views = load_views(&config.views, router, &mut diags);
        diags.into_result()?;
        Ok(Self { types, views })
    }
}

fn load_types(
    mappings: &[TypeMapping],
    resolver: &ObjectResolver,
    diags: &mut ConfigDiagnostics,
) -> TypeRegistry {
    let mut entries = FxHashMap::default();

    for (i, mapping) in mappings.iter().enumerate() {
        let Some(model_type) = resolver.model_type(&mapping.type_ref) else {
            diags.error_with_hint(
                format!("types[{i}].type"),
                format!("unknown model type `{}`", mapping.type_ref),
                format!("known types: {}", resolver.type_refs().join(", ")),
            );
            continue;
        };

        let accessor = mapping.accessor_name();
        if model_type.get_accessor(accessor).is_none() {
            diags.error_with_hint(
                format!("types[{i}].accessor"),
                format!(
                    "`{}` has no accessor `{}`",
                    mapping.type_ref,
                    accessor.unwrap_or_default()
                ),
                format!("available: {}", model_type.accessor_names().join(", ")),
            );
            continue;
        }

        if entries.contains_key(&mapping.type_ref) {
            diags.error(
                format!("types[{i}].type"),
                format!("`{}` is listed twice", mapping.type_ref),
            );
            continue;
        }

        entries.insert(
            mapping.type_ref.clone(),
            TypeEntry {
                type_ref: mapping.type_ref.clone(),
                accessor: accessor.map(str::to_owned),
            },
        );
    }

    TypeRegistry { entries }
}

fn load_views(
    mappings: &[ViewMapping],
    router: &dyn Router,
    diags: &mut ConfigDiagnostics,
) -> ViewRegistry {
    let mut entries = FxHashMap::default();

    for (i, mapping) in mappings.iter().enumerate() {
        let view = ViewId::new(&mapping.view);
        if !router.knows_view(&view) {
            diags.error(
                format!("views[{i}].view"),
                format!("no route points to view `{view}`"),
            );
            continue;
        }

        let context = mapping.context.clone().filter(|key| !key.is_empty());
        if context.is_none() && !mapping.disabled {
            diags.error_with_hint(
                format!("views[{i}].context"),
                format!("view `{view}` does not name a context key"),
                "set `context`, or `disable = true` to never resolve this view",
            );
            continue;
        }

        if entries.contains_key(&view) {
            diags.error(
                format!("views[{i}].view"),
                format!("`{view}` is listed twice"),
            );
            continue;
        }

        entries.insert(
            view.clone(),
            ViewEntry {
                view,
                context,
                remove_query: mapping.remove_query,
                disabled: mapping.disabled,
            },
        );
    }

    ViewRegistry { entries }
}
