//! Configuration sections.
//!
//! ```toml
//! [[types]]
//! type = "example.models.Item"
//! accessor = "my_url"          # optional, defaults to canonical_url
//!
//! [[views]]
//! view = "example.views.item_by_id"
//! context = "item"
//! remove_query = false
//! disable = false
//!
//! [reverse]
//! check_schemes = ["http"]
//! check_sites = ["testserver"]
//! check_unregistered = false
//! send_query = true
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 5277
//!
//! [site]
//! fixture = "fixtures/example.json"
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[[types]]`: a model type that may appear in macros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapping {
    #[serde(rename = "type", alias = "model")]
    pub type_ref: String,

    /// Accessor producing the URL; empty counts as unset.
    #[serde(default, alias = "function")]
    pub accessor: Option<String>,
}

impl TypeMapping {
    /// The configured accessor name, ignoring empty strings.
    pub fn accessor_name(&self) -> Option<&str> {
        self.accessor.as_deref().filter(|name| !name.is_empty())
    }
}

/// `[[views]]`: a routed view whose render context binds an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMapping {
    pub view: String,

    /// Context key the view binds its object under. Required unless disabled.
    #[serde(default)]
    pub context: Option<String>,

    /// Drop the query string when re-encoding.
    #[serde(default)]
    pub remove_query: bool,

    /// Never resolve URLs of this view.
    #[serde(default, rename = "disable", alias = "disabled")]
    pub disabled: bool,
}

/// `[reverse]`: live-dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverseConfig {
    /// Schemes served by this site (lowercase comparison).
    pub check_schemes: Vec<String>,

    /// Hosts served by this site (lowercase comparison).
    pub check_sites: Vec<String>,

    /// Probe unregistered views to tell live pass-through URLs from dead ones.
    pub check_unregistered: bool,

    /// Forward the query string to probes.
    pub send_query: bool,
}

impl Default for ReverseConfig {
    fn default() -> Self {
        Self {
            check_schemes: vec!["http".to_string()],
            check_sites: Vec::new(),
            check_unregistered: false,
            send_query: true,
        }
    }
}

/// `[serve]`: reference host HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub interface: IpAddr,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
        }
    }
}

/// `[site]`: reference host data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    /// JSON fixture to load instead of the built-in example data.
    pub fixture: Option<PathBuf>,
}
