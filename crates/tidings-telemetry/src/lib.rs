//! Tidings Telemetry - Logging setup for the Tidings event emitter.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats and targets
//! - Loading of the logging configuration from TOML and the environment
//! - A quiet, idempotent subscriber for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use tidings_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), tidings_telemetry::TelemetryError> {
//! let config = LogConfig::load("tidings.toml")?
//!     .with_format(LogFormat::Compact)
//!     .with_directive("tidings_events=trace")
//!     .apply_env()?;
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod config;
mod error;
mod logging;

pub use config::{LOG_FORMAT_ENV, LOG_LEVEL_ENV};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging, setup_test_logging,
};
