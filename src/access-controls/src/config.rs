//! Engine configuration.

use std::path::Path;

use access_cache::CacheConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation::MAX_PAGE_SIZE;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "ACCESS_CONTROLS_";

/// Configuration for the access engine.
///
/// Every field has a default, so an empty TOML document is a valid config:
///
/// ```toml
/// dataset_scan_batch = 500
///
/// [cache]
/// enabled = true
/// max_permission_entries = 10000
/// max_cascading_entries = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Permission cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Number of datasets fetched per repository call while scanning an
    /// organization on behalf of a user without dataset bypass.
    #[serde(default = "default_dataset_scan_batch")]
    pub dataset_scan_batch: u32,
}

fn default_dataset_scan_batch() -> u32 {
    500
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            dataset_scan_batch: default_dataset_scan_batch(),
        }
    }
}

impl AccessConfig {
    /// Creates a builder for constructing a configuration.
    pub fn builder() -> AccessConfigBuilder {
        AccessConfigBuilder::new()
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `ACCESS_CONTROLS_*` overrides read through `lookup`.
    ///
    /// Recognized keys: `CACHE_ENABLED`, `PERMISSION_CACHE_SIZE`,
    /// `CASCADING_CACHE_SIZE`, `DATASET_SCAN_BATCH`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, value)) = var("CACHE_ENABLED") {
            self.cache.enabled = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("PERMISSION_CACHE_SIZE") {
            self.cache.max_permission_entries = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = var("CASCADING_CACHE_SIZE") {
            self.cache.max_cascading_entries = parse_number(&key, &value)?;
        }
        if let Some((key, value)) = var("DATASET_SCAN_BATCH") {
            self.dataset_scan_batch = parse_number(&key, &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.max_permission_entries == 0 {
            return Err(ConfigError::invalid_value(
                "cache.max_permission_entries",
                "must be greater than 0",
            ));
        }
        if self.cache.max_cascading_entries == 0 {
            return Err(ConfigError::invalid_value(
                "cache.max_cascading_entries",
                "must be greater than 0",
            ));
        }
        if self.dataset_scan_batch == 0 || i64::from(self.dataset_scan_batch) > MAX_PAGE_SIZE {
            return Err(ConfigError::invalid_value(
                "dataset_scan_batch",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid_value(
            key,
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid_value(key, format!("'{value}': {e}")))
}

/// Builder for creating `AccessConfig` instances.
#[derive(Debug, Default)]
pub struct AccessConfigBuilder {
    config: AccessConfig,
}

impl AccessConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables caching.
    pub fn enable_cache(mut self, enable: bool) -> Self {
        self.config.cache.enabled = enable;
        self
    }

    /// Sets the bound of the permission-result store.
    pub fn max_permission_entries(mut self, max: usize) -> Self {
        self.config.cache.max_permission_entries = max;
        self
    }

    /// Sets the bound of the cascading store.
    pub fn max_cascading_entries(mut self, max: usize) -> Self {
        self.config.cache.max_cascading_entries = max;
        self
    }

    /// Sets the dataset scan batch size.
    pub fn dataset_scan_batch(mut self, batch: u32) -> Self {
        self.config.dataset_scan_batch = batch;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<AccessConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AccessConfig::default();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_permission_entries, 10_000);
        assert_eq!(config.cache.max_cascading_entries, 5_000);
        assert_eq!(config.dataset_scan_batch, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AccessConfig::from_toml_str("").unwrap(), AccessConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = AccessConfig::from_toml_str(
            r#"
            dataset_scan_batch = 100

            [cache]
            max_cascading_entries = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.dataset_scan_batch, 100);
        assert_eq!(config.cache.max_cascading_entries, 42);
        assert_eq!(config.cache.max_permission_entries, 10_000);
    }

    #[test]
    fn test_invalid_toml_values() {
        assert!(matches!(
            AccessConfig::from_toml_str("dataset_scan_batch = 5000"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            AccessConfig::from_toml_str("dataset_scan_batch = \"lots\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.toml");
        std::fs::write(&path, "[cache]\nenabled = false\n").unwrap();

        let config = AccessConfig::load(&path).unwrap();
        assert!(!config.cache.enabled);

        let missing = AccessConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(missing.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ACCESS_CONTROLS_CACHE_ENABLED", "off"),
            ("ACCESS_CONTROLS_PERMISSION_CACHE_SIZE", "64"),
            ("ACCESS_CONTROLS_DATASET_SCAN_BATCH", " 25 "),
        ]);
        let config = AccessConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert!(!config.cache.enabled);
        assert_eq!(config.cache.max_permission_entries, 64);
        assert_eq!(config.cache.max_cascading_entries, 5_000);
        assert_eq!(config.dataset_scan_batch, 25);
    }

    #[test]
    fn test_bad_override() {
        let err = AccessConfig::default()
            .with_overrides(|key| {
                (key == "ACCESS_CONTROLS_CASCADING_CACHE_SIZE").then(|| "many".to_string())
            })
            .unwrap_err();
        assert!(err.to_string().contains("ACCESS_CONTROLS_CASCADING_CACHE_SIZE"));
    }

    #[test]
    fn test_builder() {
        let config = AccessConfig::builder()
            .enable_cache(false)
            .max_permission_entries(10)
            .max_cascading_entries(5)
            .dataset_scan_batch(2)
            .build()
            .unwrap();
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.max_permission_entries, 10);
        assert_eq!(config.dataset_scan_batch, 2);

        assert!(AccessConfig::builder().max_cascading_entries(0).build().is_err());
    }
}
