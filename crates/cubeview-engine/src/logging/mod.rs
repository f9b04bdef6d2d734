//! Logging utilities.
//!
//! This module centralizes logger initialization. Library code only uses the
//! `log` facade; the `env_logger` backend is installed by the binary.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};
