//! Logger installation for native and browser hosts.

use crate::config::LogLevel;

/// Install a logger for the `log` facade.
///
/// Uses the browser console on wasm32 and `env_logger` elsewhere. A logger that
/// is already installed is left in place, only the max level is updated.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: LogLevel) {
    if console_log::init_with_level(level.to_level()).is_err() {
        log::set_max_level(level.to_level_filter());
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: LogLevel) {
    let result = env_logger::Builder::from_default_env()
        .filter_level(level.to_level_filter())
        .try_init();
    if result.is_err() {
        log::set_max_level(level.to_level_filter());
    }
}
