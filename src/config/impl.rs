use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Arc<StaticConfig> {
    try_get_config().unwrap_or_else(|| Arc::new(StaticConfig::default()))
}

/// Like [`get_config`] but `None` before initialization.
pub fn try_get_config() -> Option<Arc<StaticConfig>> {
    CONFIG.get().map(|c| c.load_full())
}

/// Initialize the global configuration from `config.toml` + `SL__*` env vars.
///
/// Subsequent calls are no-ops.
pub fn init_config() {
    init_config_from("config.toml");
}

/// Initialize the global configuration from a specific TOML path.
pub fn init_config_from(path: &str) {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load_from(path)));
}
