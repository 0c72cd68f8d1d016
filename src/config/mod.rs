//! # Fabric Configuration
//!
//! Layered, validated configuration for the deployment pipeline.
//!
//! ## Layers
//!
//! Later layers override earlier ones:
//!
//! 1. Built-in defaults ([`FabricConfig::default`])
//! 2. `<dir>/fabric-config.yaml`
//! 3. `<dir>/environments/<env>/fabric-config.yaml`
//! 4. Environment variables such as `FABRIC_RUNTIME__LOCAL_ZONE`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fabric_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let local_zone = &manager.config().runtime.local_zone;
//! # Ok(())
//! # }
//! ```

pub mod loader;

pub use loader::ConfigManager;

use crate::constants::{DEFAULT_DOMAIN_URI, DEFAULT_LOCAL_ZONE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration error: invalid value {value:?} for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: directory not found: {path}")]
    DirectoryNotFound { path: String },
}

impl ConfigurationError {
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FabricConfig {
    pub runtime: RuntimeConfig,
    pub deployer: DeployerConfig,
    pub generator: GeneratorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// URI of the domain root composite
    pub domain_uri: String,
    /// Zone served by this process; unassigned nodes deploy here
    pub local_zone: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            domain_uri: DEFAULT_DOMAIN_URI.to_string(),
            local_zone: DEFAULT_LOCAL_ZONE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployerConfig {
    /// Compensate applied commands when a deployment fails
    pub transactional: bool,
    /// Zones whose commands are never compensated
    pub non_transactional_zones: Vec<String>,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            transactional: true,
            non_transactional_zones: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Implementation kinds handled by the default component generator
    pub component_types: Vec<String>,
    /// Resource kinds handled by the default resource generator
    pub resource_types: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            component_types: vec!["rust".to_string(), "system".to_string()],
            resource_types: vec!["datasource".to_string(), "cache".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive overriding the environment default, e.g. `info`
    pub level: Option<String>,
    pub json: bool,
}

impl FabricConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let domain_uri = &self.runtime.domain_uri;
        match domain_uri.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => {}
            _ => {
                return Err(ConfigurationError::invalid_value(
                    "runtime.domain_uri",
                    domain_uri.as_str(),
                    "must be an absolute URI such as fabric3://domain",
                ))
            }
        }

        if self.runtime.local_zone.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "runtime.local_zone",
                self.runtime.local_zone.as_str(),
                "must not be empty",
            ));
        }

        let mut seen = HashSet::new();
        for zone in &self.deployer.non_transactional_zones {
            if !seen.insert(zone) {
                return Err(ConfigurationError::invalid_value(
                    "deployer.non_transactional_zones",
                    zone.as_str(),
                    "listed more than once",
                ));
            }
        }

        Ok(())
    }
}
