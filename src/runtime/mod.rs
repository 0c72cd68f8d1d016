//! # Runtime
//!
//! Narrow interfaces through which command executors act on the live
//! process, an in-memory [`LiveRuntime`] implementing all of them, and the
//! [`RuntimeBootstrap`] that wires a runtime together once at startup.
//!
//! Code modules form a visibility DAG: each contribution in a zone gets one
//! module, and attaching an extension adds the extension module as a parent
//! so the contribution's components can see its types.

mod bootstrap;
mod live;

pub use bootstrap::{RuntimeBootstrap, RuntimeHandle};
pub use live::LiveRuntime;

use crate::command::{PhysicalChannel, PhysicalComponent, PhysicalConnection, PhysicalResource};
use crate::definition::QName;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Module not found: {module}")]
    ModuleNotFound { module: String },

    #[error("Extension {extension} is still attached to {dependents:?}")]
    ExtensionInUse {
        extension: String,
        dependents: Vec<String>,
    },

    #[error("Component already exists: {uri}")]
    DuplicateComponent { uri: String },

    #[error("Component not found: {uri}")]
    ComponentNotFound { uri: String },

    #[error("Channel already exists: {uri}")]
    DuplicateChannel { uri: String },

    #[error("Channel not found: {uri}")]
    ChannelNotFound { uri: String },

    #[error("Resource already exists: {uri}")]
    DuplicateResource { uri: String },
}

/// Visibility DAG of code modules
pub trait ModuleRegistry: Send + Sync {
    /// Create the module of a contribution; provisioning twice is a no-op
    fn provision_module(&self, contribution: &str) -> Result<(), RuntimeError>;

    /// Remove a module; removing an absent module is a no-op
    fn release_module(&self, contribution: &str) -> Result<(), RuntimeError>;

    fn add_parent(&self, module: &str, parent: &str) -> Result<(), RuntimeError>;

    fn remove_parent(&self, module: &str, parent: &str) -> Result<(), RuntimeError>;

    fn has_module(&self, module: &str) -> bool;

    /// True when `target` is `module` itself or reachable through its parents
    fn is_visible(&self, module: &str, target: &str) -> bool;
}

/// Installs shared extension modules
pub trait ExtensionProvisioner: Send + Sync {
    fn provision_extension(&self, extension: &str) -> Result<(), RuntimeError>;

    fn unprovision_extension(&self, extension: &str) -> Result<(), RuntimeError>;

    fn is_extension_provisioned(&self, extension: &str) -> bool;
}

pub trait ComponentManager: Send + Sync {
    fn build_component(&self, component: &PhysicalComponent) -> Result<(), RuntimeError>;

    fn dispose_component(&self, uri: &str) -> Result<(), RuntimeError>;

    fn start_component(&self, uri: &str) -> Result<(), RuntimeError>;

    fn has_component(&self, uri: &str) -> bool;
}

/// Scoped execution contexts, one per deployable
pub trait ContextRegistry: Send + Sync {
    fn start_context(&self, deployable: &QName) -> Result<(), RuntimeError>;

    fn stop_context(&self, deployable: &QName) -> Result<(), RuntimeError>;

    fn is_context_active(&self, deployable: &QName) -> bool;
}

pub trait ChannelManager: Send + Sync {
    fn build_channel(&self, channel: &PhysicalChannel) -> Result<(), RuntimeError>;

    fn dispose_channel(&self, uri: &str) -> Result<(), RuntimeError>;

    fn attach(&self, connection: &PhysicalConnection) -> Result<(), RuntimeError>;

    fn detach(&self, connection: &PhysicalConnection) -> Result<(), RuntimeError>;
}

pub trait ResourceRegistry: Send + Sync {
    fn register_resource(&self, resource: &PhysicalResource) -> Result<(), RuntimeError>;

    fn unregister_resource(&self, uri: &str) -> Result<(), RuntimeError>;

    fn has_resource(&self, uri: &str) -> bool;
}
