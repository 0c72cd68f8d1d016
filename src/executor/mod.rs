//! # Command Executors
//!
//! One executor per [`CommandType`], registered in a
//! [`CommandExecutorRegistry`] at startup. Executors reach the live process
//! only through the narrow traits in [`crate::runtime`].
//!
//! Removal executors treat an already-absent target as success, so a
//! compensating command applied after a partial failure never fails merely
//! because the original command did not get far.

mod channels;
mod components;
mod contexts;
mod modules;
mod registry;
mod resources;

pub use channels::ChannelConnectionExecutor;
pub use components::{BuildComponentExecutor, DisposeComponentExecutor, StartComponentExecutor};
pub use contexts::{StartContextExecutor, StopContextExecutor};
pub use modules::{
    AttachExtensionExecutor, DetachExtensionExecutor, ProvisionClassloaderExecutor,
    ProvisionExtensionsExecutor, UnProvisionExtensionsExecutor, UnprovisionClassloaderExecutor,
};
pub use registry::CommandExecutorRegistry;
pub use resources::{BuildResourcesExecutor, DisposeResourcesExecutor};

use crate::command::{Command, CommandType};
use crate::runtime::{
    ChannelManager, ComponentManager, ContextRegistry, ExtensionProvisioner, ModuleRegistry,
    ResourceRegistry, RuntimeError,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("No executor registered for command type {command_type}")]
    ExecutorNotFound { command_type: CommandType },

    #[error("Configuration error: no executors registered for {missing:?}")]
    MissingExecutors { missing: Vec<CommandType> },

    #[error("Executor for {expected} received {actual}")]
    UnexpectedCommand {
        expected: CommandType,
        actual: CommandType,
    },

    #[error("Module for contribution {contribution} is not provisioned (building {component})")]
    ModuleNotProvisioned {
        contribution: String,
        component: String,
    },

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Execution error: {0}")]
    Failed(String),
}

/// Applies one command type to the live process
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    fn command_type(&self) -> CommandType;

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError>;
}

pub(crate) fn unexpected(expected: CommandType, command: &Command) -> ExecutionError {
    ExecutionError::UnexpectedCommand {
        expected,
        actual: command.command_type(),
    }
}

/// Register an executor for every command type, all backed by `runtime`
pub fn register_runtime_executors<R>(registry: &CommandExecutorRegistry, runtime: Arc<R>)
where
    R: ModuleRegistry
        + ExtensionProvisioner
        + ComponentManager
        + ContextRegistry
        + ChannelManager
        + ResourceRegistry
        + 'static,
{
    let modules: Arc<dyn ModuleRegistry> = runtime.clone();
    let extensions: Arc<dyn ExtensionProvisioner> = runtime.clone();
    let components: Arc<dyn ComponentManager> = runtime.clone();
    let contexts: Arc<dyn ContextRegistry> = runtime.clone();
    let channels: Arc<dyn ChannelManager> = runtime.clone();
    let resources: Arc<dyn ResourceRegistry> = runtime;

    let executors: Vec<Arc<dyn CommandExecutor>> = vec![
        Arc::new(ProvisionExtensionsExecutor::new(extensions.clone())),
        Arc::new(UnProvisionExtensionsExecutor::new(extensions)),
        Arc::new(ProvisionClassloaderExecutor::new(modules.clone())),
        Arc::new(UnprovisionClassloaderExecutor::new(modules.clone())),
        Arc::new(AttachExtensionExecutor::new(modules.clone())),
        Arc::new(DetachExtensionExecutor::new(modules.clone())),
        Arc::new(BuildResourcesExecutor::new(resources.clone())),
        Arc::new(DisposeResourcesExecutor::new(resources)),
        Arc::new(ChannelConnectionExecutor::new(channels)),
        Arc::new(BuildComponentExecutor::new(components.clone(), modules)),
        Arc::new(DisposeComponentExecutor::new(components.clone())),
        Arc::new(StartComponentExecutor::new(components)),
        Arc::new(StartContextExecutor::new(contexts.clone())),
        Arc::new(StopContextExecutor::new(contexts)),
    ];
    for executor in executors {
        registry.register(executor.command_type(), executor);
    }
}
