//! Process-wide config.
//!
//! Uses `arc-swap` for lock-free reads; the CLI installs the loaded config once
//! at startup and commands read it through [`cfg`].

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use super::ModelUrlConfig;

static CONFIG: LazyLock<ArcSwap<ModelUrlConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(ModelUrlConfig::default()));

#[inline]
pub fn cfg() -> Arc<ModelUrlConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: ModelUrlConfig) -> Arc<ModelUrlConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
