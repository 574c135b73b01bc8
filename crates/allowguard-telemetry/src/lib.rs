//! Allowguard Telemetry - Logging and tracing setup.
//!
//! This crate provides:
//! - Configurable `tracing` subscriber setup with several output formats
//! - A per-request context that tags log lines with the request id
//!
//! # Example
//!
//! ```rust,no_run
//! use allowguard_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), allowguard_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("allowguard_classifier=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("guard started");
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

mod context;
mod error;
mod logging;

pub use context::{ExecutionContext, RequestContext};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
