use super::{unexpected, CommandExecutor, ExecutionError};
use crate::command::{Command, CommandType};
use crate::runtime::ContextRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct StartContextExecutor {
    contexts: Arc<dyn ContextRegistry>,
}

impl StartContextExecutor {
    pub fn new(contexts: Arc<dyn ContextRegistry>) -> Self {
        Self { contexts }
    }
}

#[async_trait]
impl CommandExecutor for StartContextExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::StartContext
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::StartContext { deployable } = command else {
            return Err(unexpected(self.command_type(), command));
        };
        self.contexts.start_context(deployable)?;
        info!(deployable = %deployable, "Started context");
        Ok(())
    }
}

pub struct StopContextExecutor {
    contexts: Arc<dyn ContextRegistry>,
}

impl StopContextExecutor {
    pub fn new(contexts: Arc<dyn ContextRegistry>) -> Self {
        Self { contexts }
    }
}

#[async_trait]
impl CommandExecutor for StopContextExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::StopContext
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::StopContext { deployable } = command else {
            return Err(unexpected(self.command_type(), command));
        };
        self.contexts.stop_context(deployable)?;
        info!(deployable = %deployable, "Stopped context");
        Ok(())
    }
}
