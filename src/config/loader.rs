//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered, later ones
//! overriding earlier ones:
//!
//! 1. the built-in preset for the detected environment
//! 2. `admission-config.yaml` in the config directory (optional)
//! 3. `admission-config-{environment}.yaml` (optional)
//! 4. `TASKER_ADMISSION__SECTION__KEY` environment variables

use super::AdmissionConfig;
use crate::error::Result;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BASE_CONFIG_FILE: &str = "admission-config.yaml";
const ENV_PREFIX: &str = "TASKER_ADMISSION";

/// Loaded, validated configuration plus where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AdmissionConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> Result<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> Result<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    ///
    /// Useful for tests that must not touch global environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> Result<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading admission configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::build_layered_config(&config_directory, environment)?;
        config.validate()?;

        info!(
            environment = environment,
            config_directory = %config_directory.display(),
            cache_ttl_seconds = config.cache.ttl_seconds,
            worker_pool_size = config.engine.worker_pool_size,
            "⚙️ CONFIG: Admission configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration, validating it first
    pub fn from_config(config: AdmissionConfig, environment: &str) -> Result<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn build_layered_config(config_directory: &Path, environment: &str) -> Result<AdmissionConfig> {
        let preset = AdmissionConfig::for_environment(environment);
        let env_file = config_directory.join(format!("admission-config-{environment}.yaml"));

        let layered = Config::builder()
            .add_source(Config::try_from(&preset)?)
            .add_source(File::from(config_directory.join(BASE_CONFIG_FILE)).required(false))
            .add_source(File::from(env_file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(layered.try_deserialize::<AdmissionConfig>()?)
    }

    /// Detect the current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("TASKER_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("TASKER_ADMISSION_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdmissionError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_yield_environment_preset() {
        let dir = TempDir::new().unwrap();
        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test")
                .unwrap();

        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config().cache.ttl_seconds, 5);
        assert_eq!(manager.config_directory(), dir.path());
    }

    #[test]
    fn test_yaml_layers_override_preset() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("admission-config.yaml"),
            r#"
thresholds:
  base_max_pending: 10
cache:
  ttl_seconds: 900
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("admission-config-production.yaml"),
            r#"
cache:
  ttl_seconds: 1200
engine:
  worker_pool_size: 16
"#,
        )
        .unwrap();

        let manager = ConfigManager::load_from_directory_with_env(
            Some(dir.path().to_path_buf()),
            "production",
        )
        .unwrap();
        let config = manager.config();

        assert_eq!(config.thresholds.base_max_pending, 10);
        assert_eq!(config.cache.ttl_seconds, 1200);
        assert_eq!(config.engine.worker_pool_size, 16);
        // untouched sections keep their defaults
        assert_eq!(config.risk.high_risk_threshold, 0.6);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("admission-config.yaml"),
            r#"
load_balancer:
  pending_weight: 0.9
"#,
        )
        .unwrap();

        let result = ConfigManager::load_from_directory_with_env(
            Some(dir.path().to_path_buf()),
            "production",
        );
        assert!(matches!(result, Err(AdmissionError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_config_validates() {
        let mut config = AdmissionConfig::default();
        config.engine.worker_pool_size = 0;
        assert!(ConfigManager::from_config(config, "test").is_err());
        assert!(ConfigManager::from_config(AdmissionConfig::default(), "test").is_ok());
    }
}
