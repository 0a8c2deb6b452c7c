pub mod config;
pub mod macros;

pub use config::{init_logging, LogConfig, SCOPES};
pub use tracing::{debug, error, event, info, trace, warn, Level};

use once_cell::sync::Lazy;
use std::sync::OnceLock;

static LOG_CONFIG: OnceLock<LogConfig> = OnceLock::new();
static DEFAULT_CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::default);

pub fn get_log_config() -> &'static LogConfig {
    LOG_CONFIG.get().unwrap_or(&DEFAULT_CONFIG)
}

/// First caller wins; later configs are ignored.
pub(crate) fn set_log_config(config: LogConfig) -> bool {
    LOG_CONFIG.set(config).is_ok()
}
