use super::{unexpected, CommandExecutor, ExecutionError};
use crate::command::{Command, CommandType};
use crate::runtime::{ExtensionProvisioner, ModuleRegistry, RuntimeError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ProvisionExtensionsExecutor {
    extensions: Arc<dyn ExtensionProvisioner>,
}

impl ProvisionExtensionsExecutor {
    pub fn new(extensions: Arc<dyn ExtensionProvisioner>) -> Self {
        Self { extensions }
    }
}

#[async_trait]
impl CommandExecutor for ProvisionExtensionsExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::ProvisionExtensions
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::ProvisionExtensions { extensions } = command else {
            return Err(unexpected(self.command_type(), command));
        };
        let mut provisioned: Vec<&String> = Vec::new();
        for extension in extensions {
            if let Err(e) = self.extensions.provision_extension(extension) {
                // the command is not on the compensation stack, undo its own partial work
                for done in provisioned.iter().rev() {
                    if let Err(cleanup) = self.extensions.unprovision_extension(done) {
                        warn!(extension = %done, error = %cleanup, "Failed to release partially provisioned extension");
                    }
                }
                return Err(e.into());
            }
            provisioned.push(extension);
        }
        info!(extensions = ?extensions, "Provisioned extensions");
        Ok(())
    }
}

pub struct UnProvisionExtensionsExecutor {
    extensions: Arc<dyn ExtensionProvisioner>,
}

impl UnProvisionExtensionsExecutor {
    pub fn new(extensions: Arc<dyn ExtensionProvisioner>) -> Self {
        Self { extensions }
    }
}

#[async_trait]
impl CommandExecutor for UnProvisionExtensionsExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::UnProvisionExtensions
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::UnProvisionExtensions { extensions } = command else {
            return Err(unexpected(self.command_type(), command));
        };
        for extension in extensions {
            match self.extensions.unprovision_extension(extension) {
                Ok(()) => {}
                // still a parent of live modules, it stays until they go
                Err(RuntimeError::ExtensionInUse { dependents, .. }) => {
                    warn!(extension = %extension, dependents = ?dependents, "Extension still in use, leaving it provisioned");
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!(extensions = ?extensions, "Un-provisioned extensions");
        Ok(())
    }
}

pub struct ProvisionClassloaderExecutor {
    modules: Arc<dyn ModuleRegistry>,
}

impl ProvisionClassloaderExecutor {
    pub fn new(modules: Arc<dyn ModuleRegistry>) -> Self {
        Self { modules }
    }
}

#[async_trait]
impl CommandExecutor for ProvisionClassloaderExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::ProvisionClassloader
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::ProvisionClassloader { contribution } = command else {
            return Err(unexpected(self.command_type(), command));
        };
        self.modules.provision_module(contribution)?;
        Ok(())
    }
}

pub struct UnprovisionClassloaderExecutor {
    modules: Arc<dyn ModuleRegistry>,
}

impl UnprovisionClassloaderExecutor {
    pub fn new(modules: Arc<dyn ModuleRegistry>) -> Self {
        Self { modules }
    }
}

#[async_trait]
impl CommandExecutor for UnprovisionClassloaderExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::UnprovisionClassloader
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::UnprovisionClassloader { contribution } = command else {
            return Err(unexpected(self.command_type(), command));
        };
        self.modules.release_module(contribution)?;
        Ok(())
    }
}

/// Adds an extension module as a parent of a contribution's module
pub struct AttachExtensionExecutor {
    modules: Arc<dyn ModuleRegistry>,
}

impl AttachExtensionExecutor {
    pub fn new(modules: Arc<dyn ModuleRegistry>) -> Self {
        Self { modules }
    }
}

#[async_trait]
impl CommandExecutor for AttachExtensionExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::AttachExtension
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::AttachExtension {
            contribution,
            provider,
        } = command
        else {
            return Err(unexpected(self.command_type(), command));
        };
        self.modules.add_parent(contribution, provider)?;
        debug!(contribution = %contribution, provider = %provider, "Attached extension");
        Ok(())
    }
}

pub struct DetachExtensionExecutor {
    modules: Arc<dyn ModuleRegistry>,
}

impl DetachExtensionExecutor {
    pub fn new(modules: Arc<dyn ModuleRegistry>) -> Self {
        Self { modules }
    }
}

#[async_trait]
impl CommandExecutor for DetachExtensionExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::DetachExtension
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::DetachExtension {
            contribution,
            provider,
        } = command
        else {
            return Err(unexpected(self.command_type(), command));
        };
        self.modules.remove_parent(contribution, provider)?;
        debug!(contribution = %contribution, provider = %provider, "Detached extension");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::LiveRuntime;

    #[tokio::test]
    async fn test_attach_and_detach_extension() {
        let runtime = Arc::new(LiveRuntime::new());
        ProvisionExtensionsExecutor::new(runtime.clone())
            .execute(&Command::ProvisionExtensions {
                extensions: vec!["ext".to_string()],
            })
            .await
            .unwrap();
        ProvisionClassloaderExecutor::new(runtime.clone())
            .execute(&Command::ProvisionClassloader {
                contribution: "app".to_string(),
            })
            .await
            .unwrap();

        let attach = Command::AttachExtension {
            contribution: "app".to_string(),
            provider: "ext".to_string(),
        };
        AttachExtensionExecutor::new(runtime.clone())
            .execute(&attach)
            .await
            .unwrap();
        assert!(runtime.is_visible("app", "ext"));

        DetachExtensionExecutor::new(runtime.clone())
            .execute(&attach.compensating().unwrap())
            .await
            .unwrap();
        assert!(!runtime.is_visible("app", "ext"));
    }

    #[tokio::test]
    async fn test_unprovision_skips_extension_in_use() {
        let runtime = Arc::new(LiveRuntime::new());
        let extensions = vec!["ext".to_string(), "spare".to_string()];
        ProvisionExtensionsExecutor::new(runtime.clone())
            .execute(&Command::ProvisionExtensions {
                extensions: extensions.clone(),
            })
            .await
            .unwrap();
        runtime.provision_module("app").unwrap();
        runtime.add_parent("app", "ext").unwrap();

        UnProvisionExtensionsExecutor::new(runtime.clone())
            .execute(&Command::UnProvisionExtensions { extensions })
            .await
            .unwrap();
        assert!(runtime.is_extension_provisioned("ext"));
        assert!(runtime.is_visible("app", "ext"));
        assert!(!runtime.is_extension_provisioned("spare"));
    }

    #[tokio::test]
    async fn test_wrong_command_is_rejected() {
        let executor = ProvisionClassloaderExecutor::new(Arc::new(LiveRuntime::new()));
        let result = executor
            .execute(&Command::UnprovisionClassloader {
                contribution: "app".to_string(),
            })
            .await;
        assert_eq!(
            result,
            Err(ExecutionError::UnexpectedCommand {
                expected: CommandType::ProvisionClassloader,
                actual: CommandType::UnprovisionClassloader,
            })
        );
    }
}
