//! Observability for Galley.
//!
//! - **Logging**: `tracing` events rendered as JSON or pretty text, filtered
//!   with an `EnvFilter`
//! - **Metrics**: dispatch counters and latency through the `metrics` facade
//!
//! # Example
//!
//! ```rust,ignore
//! use galley_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! ```

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};
pub use metrics::{describe_metrics, record_context_created, record_dispatch};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
