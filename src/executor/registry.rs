use super::{CommandExecutor, ExecutionError};
use crate::command::{Command, CommandType};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Type-keyed dispatch table of command executors
///
/// Populated once at startup and shared by reference with the deployer. A
/// missing executor is a configuration defect: [`verify`](Self::verify)
/// reports it at boot, and [`execute`](Self::execute) fails with
/// [`ExecutionError::ExecutorNotFound`] if it slips through.
#[derive(Default)]
pub struct CommandExecutorRegistry {
    executors: DashMap<CommandType, Arc<dyn CommandExecutor>>,
}

impl std::fmt::Debug for CommandExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutorRegistry")
            .field("registered", &self.registered_types())
            .finish()
    }
}

impl CommandExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, command_type: CommandType, executor: Arc<dyn CommandExecutor>) {
        if self.executors.insert(command_type, executor).is_some() {
            warn!(command_type = %command_type, "Replaced existing command executor");
        } else {
            debug!(command_type = %command_type, "Registered command executor");
        }
    }

    pub fn unregister(&self, command_type: CommandType) -> bool {
        self.executors.remove(&command_type).is_some()
    }

    /// Dispatch `command` to the executor registered for its type
    ///
    /// ```rust
    /// use fabric_core::command::Command;
    /// use fabric_core::executor::{register_runtime_executors, CommandExecutorRegistry};
    /// use fabric_core::runtime::{LiveRuntime, ModuleRegistry};
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let runtime = Arc::new(LiveRuntime::new());
    /// let registry = CommandExecutorRegistry::new();
    /// register_runtime_executors(&registry, Arc::clone(&runtime));
    ///
    /// let command = Command::ProvisionClassloader { contribution: "orders".to_string() };
    /// registry.execute(&command).await.unwrap();
    /// assert!(runtime.has_module("orders"));
    /// # });
    /// ```
    pub async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let command_type = command.command_type();
        let executor = self
            .executors
            .get(&command_type)
            .map(|e| Arc::clone(e.value()))
            .ok_or(ExecutionError::ExecutorNotFound { command_type })?;

        debug!(command = %command.describe(), "Executing command");
        executor.execute(command).await
    }

    pub fn get(&self, command_type: CommandType) -> Option<Arc<dyn CommandExecutor>> {
        self.executors
            .get(&command_type)
            .map(|e| Arc::clone(e.value()))
    }

    pub fn has_executor(&self, command_type: CommandType) -> bool {
        self.executors.contains_key(&command_type)
    }

    pub fn registered_types(&self) -> Vec<CommandType> {
        let mut types: Vec<CommandType> = self.executors.iter().map(|e| *e.key()).collect();
        types.sort();
        types
    }

    /// Fail unless every command type has an executor
    pub fn verify(&self) -> Result<(), ExecutionError> {
        let missing: Vec<CommandType> = CommandType::ALL
            .iter()
            .copied()
            .filter(|t| !self.has_executor(*t))
            .collect();
        if missing.is_empty() {
            info!(executors = CommandType::ALL.len(), "Command executors verified");
            Ok(())
        } else {
            Err(ExecutionError::MissingExecutors { missing })
        }
    }
}
