//! Logging bootstrap
//!
//! Everything in the crate logs through the standard `log` facade; this module
//! only installs `env_logger` as the backend. `RUST_LOG` still takes
//! precedence over the configured level.

use crate::config::LoggingConfig;
use log::LevelFilter;
use std::str::FromStr;

/// Install the logger; calling it again is a no-op
pub fn init_logging(config: &LoggingConfig) {
    let level = LevelFilter::from_str(&config.level).unwrap_or(LevelFilter::Info);

    let initialized = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .format_module_path(false)
        .try_init()
        .is_ok();

    if initialized {
        log::debug!("Logger initialized at level {}", level);
    }
}
