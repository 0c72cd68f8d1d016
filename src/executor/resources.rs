use super::{unexpected, CommandExecutor, ExecutionError};
use crate::command::{Command, CommandType};
use crate::runtime::ResourceRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub struct BuildResourcesExecutor {
    resources: Arc<dyn ResourceRegistry>,
}

impl BuildResourcesExecutor {
    pub fn new(resources: Arc<dyn ResourceRegistry>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl CommandExecutor for BuildResourcesExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::BuildResources
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::BuildResources { resources } = command else {
            return Err(unexpected(self.command_type(), command));
        };
        for (index, resource) in resources.iter().enumerate() {
            if let Err(e) = self.resources.register_resource(resource) {
                for built in resources[..index].iter().rev() {
                    if let Err(cleanup) = self.resources.unregister_resource(&built.uri) {
                        warn!(resource = %built.uri, error = %cleanup, "Failed to release partially built resource");
                    }
                }
                return Err(e.into());
            }
        }
        info!(count = resources.len(), "Built resources");
        Ok(())
    }
}

pub struct DisposeResourcesExecutor {
    resources: Arc<dyn ResourceRegistry>,
}

impl DisposeResourcesExecutor {
    pub fn new(resources: Arc<dyn ResourceRegistry>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl CommandExecutor for DisposeResourcesExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::DisposeResources
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::DisposeResources { resources } = command else {
            return Err(unexpected(self.command_type(), command));
        };
        for resource in resources.iter().rev() {
            self.resources.unregister_resource(&resource.uri)?;
        }
        info!(count = resources.len(), "Disposed resources");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::PhysicalResource;
    use crate::definition::QName;
    use crate::runtime::{LiveRuntime, RuntimeError};

    fn resource(name: &str) -> PhysicalResource {
        PhysicalResource {
            uri: format!("fabric3://domain/{name}"),
            kind: "datasource".to_string(),
            deployable: QName::new("urn:test", "bar"),
            settings: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_partial_build_is_undone() {
        let runtime = Arc::new(LiveRuntime::new());
        runtime.register_resource(&resource("taken")).unwrap();

        let result = BuildResourcesExecutor::new(runtime.clone())
            .execute(&Command::BuildResources {
                resources: vec![resource("db"), resource("taken")],
            })
            .await;

        assert_eq!(
            result,
            Err(ExecutionError::Runtime(RuntimeError::DuplicateResource {
                uri: "fabric3://domain/taken".to_string()
            }))
        );
        assert!(!runtime.has_resource("fabric3://domain/db"));
        assert!(runtime.has_resource("fabric3://domain/taken"));
    }
}
