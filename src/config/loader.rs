//! Configuration Loader
//!
//! Environment-aware loading: discovers the base and per-environment YAML
//! files, merges them over the defaults and applies environment variable
//! overrides.

use super::{ConfigResult, ConfigurationError, FabricConfig};
use crate::constants::{DEFAULT_ENVIRONMENT, ENVIRONMENT_VAR};
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_FILE: &str = "fabric-config.yaml";

#[derive(Debug)]
pub struct ConfigManager {
    config: FabricConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a directory with an explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);
        if !config_directory.is_dir() {
            return Err(ConfigurationError::DirectoryNotFound {
                path: config_directory.display().to_string(),
            });
        }

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        info!(
            environment = %environment,
            domain_uri = %config.runtime.domain_uri,
            local_zone = %config.runtime.local_zone,
            transactional = config.deployer.transactional,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Manager over an already-built configuration, validated but not loaded from disk
    pub fn from_config(config: FabricConfig, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        }))
    }

    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Environment from `FABRIC_ENV`, defaulting to `development`
    pub fn detect_environment() -> String {
        env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("FABRIC_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn load_and_merge_config(directory: &Path, environment: &str) -> ConfigResult<FabricConfig> {
        let base = directory.join(CONFIG_FILE);
        let overlay = directory
            .join("environments")
            .join(environment)
            .join(CONFIG_FILE);
        debug!(
            base = %base.display(),
            base_exists = base.exists(),
            overlay = %overlay.display(),
            overlay_exists = overlay.exists(),
            "Resolved configuration files"
        );

        let merged = Config::builder()
            .add_source(Config::try_from(&FabricConfig::default())?)
            .add_source(File::from(base).format(FileFormat::Yaml).required(false))
            .add_source(File::from(overlay).format(FileFormat::Yaml).required(false))
            .add_source(
                Environment::with_prefix("FABRIC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        merged.try_deserialize().map_err(ConfigurationError::from)
    }
}
