//! Logging setup for the groupcache Datadog exporter.
//!
//! Wraps `tracing-subscriber` so binaries and tests can pick an output format
//! (pretty, compact or JSON) and a filter without repeating the layer wiring.
//!
//! # Example
//!
//! ```ignore
//! use groupcache_datadog_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Pretty, None)?;
//! tracing::info!("exporter started");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};
