//! # Runtime Bootstrap
//!
//! Wires a complete runtime from configuration: the live runtime, the
//! executor registry, the generator, the deployer and the domain.
//!
//! ```text
//! ConfigManager → LiveRuntime → CommandExecutorRegistry (verified)
//!               → ExtensionTracker + ContributionRegistry → Generator
//!               → Deployer (transport) → Domain (journal, allocator)
//! ```

use super::LiveRuntime;
use crate::config::{ConfigManager, FabricConfig};
use crate::deployer::{Deployer, LocalOnlyTransport, ZoneTransport};
use crate::domain::{Allocator, ContributionRegistry, Domain, DomainJournal, InMemoryJournal};
use crate::error::Result;
use crate::executor::{register_runtime_executors, CommandExecutorRegistry};
use crate::extension_tracker::ExtensionTracker;
use crate::generator::Generator;
use crate::logging;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Handle over a bootstrapped runtime
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    pub domain: Arc<Domain>,
    pub runtime: Arc<LiveRuntime>,
    pub registry: Arc<CommandExecutorRegistry>,
    pub generator: Arc<Generator>,
    pub contributions: Arc<ContributionRegistry>,
    pub config_manager: Arc<ConfigManager>,
}

impl RuntimeHandle {
    pub fn status(&self) -> RuntimeStatus {
        let config = self.config_manager.config();
        RuntimeStatus {
            environment: self.config_manager.environment().to_string(),
            domain_uri: config.runtime.domain_uri.clone(),
            local_zone: config.runtime.local_zone.clone(),
            deployed: self.domain.deployed().len(),
            components: self.runtime.component_uris().len(),
            executors: self.registry.registered_types().len(),
        }
    }
}

/// Snapshot of a running runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    pub environment: String,
    pub domain_uri: String,
    pub local_zone: String,
    pub deployed: usize,
    pub components: usize,
    pub executors: usize,
}

/// Builder for a [`RuntimeHandle`]
pub struct RuntimeBootstrap {
    config_manager: Arc<ConfigManager>,
    transport: Arc<dyn ZoneTransport>,
    journal: Arc<dyn DomainJournal>,
    allocator: Option<Arc<dyn Allocator>>,
    init_logging: bool,
}

impl RuntimeBootstrap {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self {
            config_manager,
            transport: Arc::new(LocalOnlyTransport),
            journal: Arc::new(InMemoryJournal::new()),
            allocator: None,
            init_logging: false,
        }
    }

    /// Bootstrap from an in-memory configuration
    pub fn from_config(config: FabricConfig) -> Result<Self> {
        let environment = ConfigManager::detect_environment();
        Ok(Self::new(ConfigManager::from_config(config, &environment)?))
    }

    /// Bootstrap from a configuration directory
    ///
    /// `None` values fall back to `FABRIC_CONFIG_DIR` and `FABRIC_ENV`.
    pub fn load(config_directory: Option<PathBuf>, environment: Option<&str>) -> Result<Self> {
        let manager = match environment {
            Some(environment) => {
                ConfigManager::load_from_directory_with_env(config_directory, environment)?
            }
            None => ConfigManager::load_from_directory(config_directory)?,
        };
        Ok(Self::new(manager))
    }

    pub fn with_transport(mut self, transport: Arc<dyn ZoneTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn DomainJournal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Install the global tracing subscriber from the logging configuration
    pub fn with_logging(mut self) -> Self {
        self.init_logging = true;
        self
    }

    pub fn bootstrap(self) -> Result<RuntimeHandle> {
        let config = self.config_manager.config();
        if self.init_logging {
            logging::init_with_config(&config.logging);
        }

        let runtime = Arc::new(LiveRuntime::new());
        let registry = Arc::new(CommandExecutorRegistry::new());
        register_runtime_executors(&registry, Arc::clone(&runtime));
        registry.verify()?;

        let tracker = Arc::new(ExtensionTracker::new());
        let contributions = Arc::new(ContributionRegistry::new());
        let generator = Arc::new(Generator::from_config(
            &config.generator,
            Arc::clone(&tracker),
            contributions.clone(),
            config.runtime.local_zone.as_str(),
        ));
        let deployer = Arc::new(Deployer::new(
            Arc::clone(&registry),
            self.transport,
            &config.deployer,
            config.runtime.local_zone.as_str(),
        ));

        let mut domain = Domain::new(
            &config.runtime.domain_uri,
            Arc::clone(&generator),
            deployer,
            tracker,
            Arc::clone(&contributions),
            self.journal,
        );
        if let Some(allocator) = self.allocator {
            domain = domain.with_allocator(allocator);
        }

        info!(
            environment = %self.config_manager.environment(),
            domain_uri = %config.runtime.domain_uri,
            local_zone = %config.runtime.local_zone,
            executors = registry.registered_types().len(),
            "Runtime bootstrapped"
        );

        Ok(RuntimeHandle {
            domain: Arc::new(domain),
            runtime,
            registry,
            generator,
            contributions,
            config_manager: self.config_manager,
        })
    }
}
