//! Example routes, views and templates.

use std::sync::Arc;

use regex::Regex;

use super::DemoSite;
use super::models::{Item, Page};
use crate::site::{Context, Renderer, Response, RouteMatch, Site, Value, ViewId};

pub type View = fn(&DemoSite, &RouteMatch) -> Response;

/// One entry of the routing table. Patterns match the path without its leading `/`.
pub struct Route {
    pub pattern: Regex,
    pub view: ViewId,
    pub handler: View,
}

impl Route {
    fn new(pattern: &str, view: &str, handler: View) -> Self {
        Self {
            pattern: Regex::new(&format!("^{pattern}$")).expect("route pattern is valid"),
            view: ViewId::new(view),
            handler,
        }
    }

    /// Match `path`, splitting unnamed groups into `args` and named ones into `kwargs`.
    pub fn matches(&self, path: &str) -> Option<RouteMatch> {
        let caps = self.pattern.captures(path)?;
        let mut route = RouteMatch {
            view: self.view.clone(),
            args: Vec::new(),
            kwargs: Default::default(),
        };
        for (i, name) in self.pattern.capture_names().enumerate().skip(1) {
            let Some(value) = caps.get(i) else {
                continue;
            };
            match name {
                Some(name) => {
                    route.kwargs.insert(name.to_string(), value.as_str().to_string());
                }
                None => route.args.push(value.as_str().to_string()),
            }
        }
        Some(route)
    }
}

pub fn routes() -> Vec<Route> {
    let simple: [(&str, View); 14] = [
        ("response", |_, _| Response::ok("Done")),
        ("notfound", |_, _| Response::html(404, "Not found")),
        ("error", |_, _| Response::html(500, "Error")),
        ("redirect_response", |_, _| Response::redirect("/response", false)),
        ("redirect_notfound", |_, _| Response::redirect("/notfound", false)),
        ("redirect_redirect_response", |_, _| {
            Response::redirect("/redirect_response", false)
        }),
        ("redirect_cicle", |_, _| Response::redirect("/redirect_cicle", false)),
        ("redirect_a_to_redirect_b_cicle", |_, _| {
            Response::redirect("/redirect_b_to_redirect_a_cicle", false)
        }),
        ("redirect_b_to_redirect_a_cicle", |_, _| {
            Response::redirect("/redirect_a_to_redirect_b_cicle", false)
        }),
        ("redirect_page1", |_, _| Response::redirect("/page_by_id/1", false)),
        ("redirect_page12", |_, _| Response::redirect("/page_by_id/12", false)),
        ("permanent_redirect_response", |_, _| Response::redirect("/response", true)),
        ("http404", |_, _| Response::not_found()),
        ("http500", |_, _| panic!("http500 view failed")),
    ];

    let mut routes: Vec<Route> = simple
        .into_iter()
        .map(|(name, handler)| Route::new(name, &format!("example.views.{name}"), handler))
        .collect();

    routes.extend([
        Route::new(r"page_by_id/(\d{1,8})", "example.views.page_by_id", page_by_id),
        Route::new(r"item_by_id/(\d{1,8})", "example.views.item_by_id", item_by_id),
        Route::new(
            r"item_by_barcode/(?P<barcode>\w+)",
            "example.views.item_by_barcode",
            item_by_barcode,
        ),
        Route::new("admin/", "example.admin.root", |_, _| Response::ok("Admin")),
    ]);
    routes
}

fn render(site: &DemoSite, template: &str, key: &str, value: Value) -> Response {
    let mut context = Context::default();
    context.insert(key.to_string(), value);
    Response::ok(site.templates().render(template, &context))
}

fn page_by_id(site: &DemoSite, route: &RouteMatch) -> Response {
    let pk = route.args.first().map_or("", String::as_str);
    match site.fixture().page(pk) {
        Some(page) => render(site, "page.html", "page", Value::Object(Arc::new(page.clone()))),
        None => Response::not_found(),
    }
}

fn item_by_id(site: &DemoSite, route: &RouteMatch) -> Response {
    let pk = route.args.first().map_or("", String::as_str);
    match site.fixture().item(pk) {
        Some(item) => render(site, "item.html", "item", Value::Object(Arc::new(item.clone()))),
        None => Response::not_found(),
    }
}

fn item_by_barcode(site: &DemoSite, route: &RouteMatch) -> Response {
    let barcode = route.kwargs.get("barcode").map_or("", String::as_str);
    match site.fixture().item_by_barcode(barcode) {
        Some(item) => render(site, "item.html", "item", Value::Object(Arc::new(item.clone()))),
        None => Response::not_found(),
    }
}

/// `page.html` shows the page content, `item.html` the barcode.
pub struct Templates;

impl Renderer for Templates {
    fn render(&self, template: &str, context: &Context) -> String {
        let bound = |key: &str| context.get(key).and_then(Value::as_object);
        match template {
            "page.html" => bound("page")
                .and_then(|object| object.as_any().downcast_ref::<Page>())
                .map(|page| page.content.clone()),
            "item.html" => bound("item")
                .and_then(|object| object.as_any().downcast_ref::<Item>())
                .map(|item| item.barcode.clone()),
            _ => None,
        }
        .unwrap_or_default()
    }
}
