use super::{unexpected, CommandExecutor, ExecutionError};
use crate::command::{Command, CommandType};
use crate::runtime::{ComponentManager, ModuleRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds a component once its contribution's module is visible
pub struct BuildComponentExecutor {
    components: Arc<dyn ComponentManager>,
    modules: Arc<dyn ModuleRegistry>,
}

impl BuildComponentExecutor {
    pub fn new(components: Arc<dyn ComponentManager>, modules: Arc<dyn ModuleRegistry>) -> Self {
        Self {
            components,
            modules,
        }
    }
}

#[async_trait]
impl CommandExecutor for BuildComponentExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::BuildComponent
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::BuildComponent(component) = command else {
            return Err(unexpected(self.command_type(), command));
        };
        if !self.modules.has_module(&component.contribution) {
            return Err(ExecutionError::ModuleNotProvisioned {
                contribution: component.contribution.clone(),
                component: component.uri.clone(),
            });
        }
        self.components.build_component(component)?;
        info!(
            component = %component.uri,
            deployable = %component.deployable,
            implementation = %component.implementation,
            "Built component"
        );
        Ok(())
    }
}

pub struct DisposeComponentExecutor {
    components: Arc<dyn ComponentManager>,
}

impl DisposeComponentExecutor {
    pub fn new(components: Arc<dyn ComponentManager>) -> Self {
        Self { components }
    }
}

#[async_trait]
impl CommandExecutor for DisposeComponentExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::DisposeComponent
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::DisposeComponent(component) = command else {
            return Err(unexpected(self.command_type(), command));
        };
        self.components.dispose_component(&component.uri)?;
        info!(component = %component.uri, "Disposed component");
        Ok(())
    }
}

pub struct StartComponentExecutor {
    components: Arc<dyn ComponentManager>,
}

impl StartComponentExecutor {
    pub fn new(components: Arc<dyn ComponentManager>) -> Self {
        Self { components }
    }
}

#[async_trait]
impl CommandExecutor for StartComponentExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::StartComponent
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::StartComponent { uri } = command else {
            return Err(unexpected(self.command_type(), command));
        };
        self.components.start_component(uri)?;
        debug!(component = %uri, "Started component");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::PhysicalComponent;
    use crate::definition::QName;
    use crate::runtime::LiveRuntime;

    fn component() -> PhysicalComponent {
        PhysicalComponent {
            uri: "fabric3://domain/component".to_string(),
            contribution: "test".to_string(),
            deployable: QName::new("urn:test", "bar"),
            implementation: "rust".to_string(),
            eager_init: true,
            references: Vec::new(),
            properties: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_build_requires_module() {
        let runtime = Arc::new(LiveRuntime::new());
        let executor = BuildComponentExecutor::new(runtime.clone(), runtime.clone());
        let build = Command::BuildComponent(component());

        assert!(matches!(
            executor.execute(&build).await,
            Err(ExecutionError::ModuleNotProvisioned { .. })
        ));

        runtime.provision_module("test").unwrap();
        executor.execute(&build).await.unwrap();
        assert!(runtime.has_component("fabric3://domain/component"));
    }

    #[tokio::test]
    async fn test_build_start_dispose() {
        let runtime = Arc::new(LiveRuntime::new());
        runtime.provision_module("test").unwrap();
        let build = Command::BuildComponent(component());

        BuildComponentExecutor::new(runtime.clone(), runtime.clone())
            .execute(&build)
            .await
            .unwrap();
        StartComponentExecutor::new(runtime.clone())
            .execute(&Command::StartComponent {
                uri: "fabric3://domain/component".to_string(),
            })
            .await
            .unwrap();
        assert!(runtime.is_started("fabric3://domain/component"));

        let dispose = DisposeComponentExecutor::new(runtime.clone());
        dispose.execute(&build.compensating().unwrap()).await.unwrap();
        assert!(!runtime.has_component("fabric3://domain/component"));
        // disposing twice is harmless
        dispose.execute(&build.compensating().unwrap()).await.unwrap();
    }
}
