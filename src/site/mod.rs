//! Narrow interfaces to the hosting web framework.
//!
//! | Item             | Collaborator role                                   |
//! |------------------|-----------------------------------------------------|
//! | `Router`         | path → view identity + arguments                    |
//! | `Dispatcher`     | in-process request through the full pipeline        |
//! | `Renderer`       | template rendering primitive                        |
//! | `TemplateEngine` | shared render entry point, wrapped by `capture`     |
//! | `Middleware`     | response post-processing hook                       |
//! | `Site`           | all of the above, as one host application           |

mod response;

pub use response::{DEFAULT_CONTENT_TYPE, Response};

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::model::Object;

// =============================================================================
// Routing
// =============================================================================

/// Identity of a routed view, e.g. `example.views.page_by_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(Arc<str>);

impl ViewId {
    pub fn new(path: &str) -> Self {
        Self(Arc::from(path))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewId {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Result of routing a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub view: ViewId,
    pub args: Vec<String>,
    pub kwargs: FxHashMap<String, String>,
}

/// The routing table.
pub trait Router: Send + Sync {
    /// Find the view responsible for `path`.
    fn resolve(&self, path: &str) -> Option<RouteMatch>;

    /// Whether `view` exists at all (used to validate view mappings at load time).
    fn knows_view(&self, _view: &ViewId) -> bool {
        true
    }
}

/// Runs a request through routing, views and middleware, synchronously.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, path: &str, query: Option<&str>) -> Response;
}

/// A host application: its routing table, its request pipeline and the
/// template engine its views render through.
pub trait Site: Router + Dispatcher {
    fn templates(&self) -> &TemplateEngine;
}

/// Post-processes every response produced by a dispatcher.
pub trait Middleware: Send + Sync {
    fn process_response(&self, response: Response) -> Response;
}

// =============================================================================
// Rendering
// =============================================================================

/// A value bound in a render context.
#[derive(Clone)]
pub enum Value {
    Object(Object),
    Text(String),
}

impl Value {
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(object) => write!(
                f,
                "Object({} {})",
                object.type_ref(),
                object.primary_key()
            ),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Variable bindings handed to a render call.
pub type Context = FxHashMap<String, Value>;

/// The rendering primitive every view goes through.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &Context) -> String;

    /// Whether this renderer already carries the capture interception.
    fn intercepts(&self) -> bool {
        false
    }
}

/// Shared render entry point.
///
/// Holds the active renderer in an atomic slot so the interception can be
/// installed once at startup without views noticing.
pub struct TemplateEngine {
    renderer: ArcSwap<Box<dyn Renderer>>,
}

impl TemplateEngine {
    pub fn new(renderer: impl Renderer + 'static) -> Self {
        let boxed: Box<dyn Renderer> = Box::new(renderer);
        Self {
            renderer: ArcSwap::from_pointee(boxed),
        }
    }

    /// Render through whatever renderer is currently installed.
    pub fn render(&self, template: &str, context: &Context) -> String {
        self.renderer.load().render(template, context)
    }

    /// Whether the installed renderer carries the capture interception.
    pub fn is_intercepted(&self) -> bool {
        self.renderer.load().intercepts()
    }

    /// Replace the renderer with a decorator around the current one.
    ///
    /// Callers serialize wrapping themselves (see `capture::install`).
    pub fn wrap<F>(&self, decorate: F)
    where
        F: FnOnce(Arc<Box<dyn Renderer>>) -> Box<dyn Renderer>,
    {
        let current = self.renderer.load_full();
        self.renderer.store(Arc::new(decorate(current)));
    }
}

/// Renders through a shared boxed renderer; lets decorators hold the previous slot value.
impl Renderer for Arc<Box<dyn Renderer>> {
    fn render(&self, template: &str, context: &Context) -> String {
        (**self).render(template, context)
    }

    fn intercepts(&self) -> bool {
        (**self).intercepts()
    }
}
