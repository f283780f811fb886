//! In-process example host.
//!
//! A tiny application with pages and items, its routing table, its views and
//! a middleware chain, standing in for the web framework the rewriting layer
//! plugs into. The CLI serves it and the test suites resolve against it.
//!
//! | URL                         | View                            | Binds  |
//! |-----------------------------|---------------------------------|--------|
//! | `/page_by_id/<id>`          | `example.views.page_by_id`      | `page` |
//! | `/item_by_id/<id>`          | `example.views.item_by_id`      | `item` |
//! | `/item_by_barcode/<code>`   | `example.views.item_by_barcode` | `item` |
//! | `/response`, `/redirect_*`… | status and redirect fixtures    |        |
//! | `/admin/`                   | `example.admin.root`            |        |

pub mod models;
mod views;

pub use models::{Fixture, ITEM, Item, PAGE, Page};

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{ConfigError, ModelUrlConfig, ReverseConfig};
use crate::core::decode_path;
use crate::debug;
use crate::error::ReplaceError;
use crate::model::ObjectResolver;
use crate::registry::Registry;
use crate::reverse::{DictionaryResolver, Snapshot, ViewResolver};
use crate::rewrite::{RewriteMiddleware, Rewriter};
use crate::site::{
    Dispatcher, Middleware, Response, RouteMatch, Router, Site, TemplateEngine, ViewId,
};
use views::{Route, Templates};

/// Mappings for the example application.
pub const EXAMPLE_CONFIG: &str = include_str!("example.toml");

/// The example application.
pub struct DemoSite {
    routes: Vec<Route>,
    fixture: Arc<Fixture>,
    resolver: Arc<ObjectResolver>,
    templates: TemplateEngine,
    middleware: RwLock<Vec<Arc<dyn Middleware>>>,
}

impl DemoSite {
    /// Site over the built-in example data.
    pub fn new() -> Self {
        Self::with_fixture(Fixture::example())
    }

    pub fn with_fixture(fixture: Fixture) -> Self {
        let fixture = Arc::new(fixture);
        Self {
            routes: views::routes(),
            resolver: Arc::new(models::catalog(Arc::clone(&fixture))),
            fixture,
            templates: TemplateEngine::new(Templates),
            middleware: RwLock::new(Vec::new()),
        }
    }

    #[inline]
    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    #[inline]
    pub fn resolver(&self) -> &Arc<ObjectResolver> {
        &self.resolver
    }

    /// Append a middleware; it sees every response produced afterwards.
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware>) {
        self.middleware.write().push(middleware);
    }

    /// Identities of every routed view.
    pub fn views(&self) -> impl Iterator<Item = &ViewId> {
        self.routes.iter().map(|route| &route.view)
    }

    fn route(&self, path: &str) -> Option<(&Route, RouteMatch)> {
        let path = path.strip_prefix('/')?;
        self.routes
            .iter()
            .find_map(|route| route.matches(path).map(|matched| (route, matched)))
    }
}

impl Default for DemoSite {
    fn default() -> Self {
        Self::new()
    }
}

impl Router for DemoSite {
    fn resolve(&self, path: &str) -> Option<RouteMatch> {
        self.route(path).map(|(_, matched)| matched)
    }

    fn knows_view(&self, view: &ViewId) -> bool {
        self.views().any(|known| known == view)
    }
}

impl Dispatcher for DemoSite {
    /// Route, run the view, then the middleware chain.
    ///
    /// A panicking view becomes a `500`. The query string is accepted but no
    /// example view reads it.
    fn dispatch(&self, path: &str, _query: Option<&str>) -> Response {
        let response = match self.route(&decode_path(path)) {
            Some((route, matched)) => {
                let handler = route.handler;
                panic::catch_unwind(AssertUnwindSafe(|| handler(self, &matched))).unwrap_or_else(
                    |_| {
                        debug!("serve"; "view {} panicked", matched.view);
                        Response::server_error()
                    },
                )
            }
            None => Response::not_found(),
        };

        let chain: Vec<_> = self.middleware.read().iter().cloned().collect();
        chain
            .iter()
            .fold(response, |response, middleware| middleware.process_response(response))
    }
}

impl Site for DemoSite {
    fn templates(&self) -> &TemplateEngine {
        &self.templates
    }
}

/// The example application wired to the rewriting layer.
pub struct Host {
    pub site: Arc<DemoSite>,
    pub registry: Registry,
    pub rewriter: Arc<Rewriter>,
    pub reverse: ReverseConfig,
}

impl Host {
    /// Load data, validate mappings and install forward rewriting as middleware.
    pub fn build(config: &ModelUrlConfig) -> Result<Self, ConfigError> {
        let fixture = match &config.site.fixture {
            Some(path) => Fixture::load(&config.root_join(path))?,
            None => Fixture::example(),
        };
        let site = Arc::new(DemoSite::with_fixture(fixture));
        let registry = Registry::load(config, site.resolver(), site.as_ref())?;

        let rewriter = Arc::new(Rewriter::new(
            Arc::clone(site.resolver()),
            registry.types.clone(),
        ));
        site.add_middleware(Arc::new(RewriteMiddleware::new(Arc::clone(&rewriter))));

        Ok(Self {
            site,
            registry,
            rewriter,
            reverse: config.reverse.clone(),
        })
    }

    /// Host over [`EXAMPLE_CONFIG`] and the built-in data.
    pub fn example() -> Result<Self, ConfigError> {
        Self::build(&ModelUrlConfig::from_str(EXAMPLE_CONFIG)?)
    }

    /// Live-dispatch resolver configured by `[reverse]`.
    pub fn view_resolver(&self) -> ViewResolver<DemoSite> {
        ViewResolver::new(
            Arc::clone(&self.site),
            self.registry.views.clone(),
            Arc::clone(&self.rewriter),
        )
        .with_options(self.reverse.clone())
    }

    /// Dictionary resolver over every object of every mapped type.
    pub fn dict_resolver(&self) -> Result<DictionaryResolver, ReplaceError> {
        Snapshot::from_objects(self.rewriter.resolver(), self.rewriter.types())
            .map(DictionaryResolver::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(site: &DemoSite, path: &str) -> Response {
        site.dispatch(path, None)
    }

    #[test]
    fn test_statuses() {
        let site = DemoSite::new();
        let cases = [
            ("/response", 200),
            ("/notfound", 404),
            ("/error", 500),
            ("/redirect_response", 302),
            ("/redirect_notfound", 302),
            ("/redirect_redirect_response", 302),
            ("/redirect_a_to_redirect_b_cicle", 302),
            ("/redirect_b_to_redirect_a_cicle", 302),
            ("/redirect_page1", 302),
            ("/redirect_page12", 302),
            ("/redirect_cicle", 302),
            ("/permanent_redirect_response", 301),
            ("/http404", 404),
            ("/http500", 500),
            ("/doesnotexists", 404),
            ("/page_by_id/2", 404),
            ("/page_by_id/string", 404),
            ("/item_by_id/3", 404),
            ("/item_by_id/string", 404),
            ("/item_by_barcode/string", 404),
        ];
        for (path, status) in cases {
            assert_eq!(get(&site, path).status, status, "{path}");
        }
    }

    #[test]
    fn test_object_views_render() {
        let site = DemoSite::new();
        assert_eq!(get(&site, "/page_by_id/1").body, "page");
        assert_eq!(get(&site, "/page_by_id/11").body, "eleven");
        assert_eq!(get(&site, "/item_by_id/1").body, "first");
        assert_eq!(get(&site, "/item_by_id/2").body, "second");
        assert_eq!(get(&site, "/item_by_barcode/first").body, "first");
        assert_eq!(get(&site, "/item_by_barcode/second").body, "second");
    }

    #[test]
    fn test_routing() {
        let site = DemoSite::new();
        let matched = site.resolve("/item_by_barcode/first").unwrap();
        assert_eq!(matched.view, ViewId::new("example.views.item_by_barcode"));
        assert_eq!(matched.kwargs.get("barcode").map(String::as_str), Some("first"));

        let matched = site.resolve("/page_by_id/11").unwrap();
        assert_eq!(matched.args, vec!["11".to_string()]);

        assert!(site.resolve("/page_by_id/1/").is_none());
        assert!(site.resolve("page_by_id/1").is_none());
        assert!(site.knows_view(&ViewId::new("example.admin.root")));
        assert!(!site.knows_view(&ViewId::new("example.views.missing")));
    }

    #[test]
    fn test_middleware_rewrites_page_content() {
        let fixture = Fixture {
            pages: vec![Page {
                id: 5,
                content: r#"<a href="{@ example.models.Item 2 @}">second</a>"#.to_string(),
            }],
            ..Fixture::example()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, serde_json::to_string(&fixture).unwrap()).unwrap();

        let mut config = ModelUrlConfig::from_str(EXAMPLE_CONFIG).unwrap();
        config.site.fixture = Some(path);
        let host = Host::build(&config).unwrap();

        assert_eq!(
            host.site.dispatch("/page_by_id/5", None).body,
            r#"<a href="/item_by_barcode/second">second</a>"#
        );
    }
}
