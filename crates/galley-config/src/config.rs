//! Root configuration type.

use serde::{Deserialize, Serialize};

use crate::{AppConfig, ConfigError, LogFormat, LoggingConfig, PoolConfig};

/// Complete Galley configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use galley_config::GalleyConfig;
///
/// let config = GalleyConfig::default();
/// assert_eq!(config.app.name, "galley");
/// assert_eq!(config.pool.max_idle, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GalleyConfig {
    /// Application identity.
    #[serde(default)]
    pub app: AppConfig,

    /// Dispatch context pool.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GalleyConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - `pool.max_idle` is zero
    /// - `pool.prewarm` exceeds `pool.max_idle`
    /// - `logging.level` is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.max_idle == 0 {
            return Err(ConfigError::invalid_value(
                "pool.max_idle",
                "must be greater than 0",
            ));
        }

        if self.pool.prewarm > self.pool.max_idle {
            return Err(ConfigError::invalid_value(
                "pool.prewarm",
                format!(
                    "{} exceeds pool.max_idle ({})",
                    self.pool.prewarm, self.pool.max_idle
                ),
            ));
        }

        if let Err(e) = galley_telemetry::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs with colors and locations.
    ///
    /// ```
    /// use galley_config::GalleyConfig;
    ///
    /// let config = GalleyConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.app.environment = "development".to_string();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config
    }

    /// Production preset: JSON info logs and a prewarmed pool.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.app.environment = "production".to_string();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.pool.prewarm = 64;

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GalleyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.app.environment, "development");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_presets_are_valid() {
        let dev = GalleyConfig::development();
        assert!(dev.validate().is_ok());
        assert_eq!(dev.logging.format, LogFormat::Pretty);

        let prod = GalleyConfig::production();
        assert!(prod.validate().is_ok());
        assert_eq!(prod.app.environment, "production");
        assert_eq!(prod.pool.prewarm, 64);
    }

    #[test]
    fn test_validate_zero_max_idle() {
        let mut config = GalleyConfig::default();
        config.pool.max_idle = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "pool.max_idle"
        ));
    }

    #[test]
    fn test_validate_prewarm_exceeds_max_idle() {
        let mut config = GalleyConfig::default();
        config.pool.prewarm = 10;
        config.pool.max_idle = 5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "pool.prewarm"
        ));
    }

    #[test]
    fn test_validate_bad_log_level() {
        let mut config = GalleyConfig::default();
        config.logging.level = "galley=loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "logging.level"
        ));
    }

    #[test]
    fn test_toml_roundtrip_of_preset() {
        let config = GalleyConfig::production();
        let text = toml::to_string(&config).unwrap();
        let parsed: GalleyConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
