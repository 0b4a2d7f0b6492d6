//! Logger setup. Code logs through the `log` macros; only this module knows
//! about `env_logger`.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
