//! Typed configuration for Galley.
//!
//! - TOML and JSON files
//! - `GALLEY__SECTION__KEY` environment overrides and `.env` files
//! - Strict parsing (unknown fields are errors)
//! - Validation after all layers are applied
//!
//! # Example
//!
//! ```no_run
//! use galley_config::ConfigLoader;
//!
//! # fn main() -> Result<(), galley_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("galley.toml")?
//!     .with_env_prefix("GALLEY")
//!     .load()?;
//!
//! println!("pool keeps up to {} idle contexts", config.pool.max_idle);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [app]
//! name = "galley"
//! environment = "development"
//!
//! [pool]
//! prewarm = 0
//! max_idle = 1024
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ansi_enabled = false
//! include_location = false
//! ```

mod config;
mod error;
mod loader;
mod schema;

pub use config::GalleyConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AppConfig, LogFormat, LoggingConfig, PoolConfig};
