#![allow(dead_code)]

use async_trait::async_trait;
use fabric_core::command::{Command, CommandType};
use fabric_core::config::FabricConfig;
use fabric_core::definition::{Composite, ComponentDefinition, QName};
use fabric_core::domain::{Contribution, DomainJournal, InMemoryJournal};
use fabric_core::executor::{CommandExecutor, ExecutionError};
use fabric_core::runtime::{RuntimeBootstrap, RuntimeHandle};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

pub const NAMESPACE: &str = "urn:test";

pub fn qname(local: &str) -> QName {
    QName::new(NAMESPACE, local)
}

pub fn bootstrap() -> RuntimeHandle {
    bootstrap_with_journal(Arc::new(InMemoryJournal::new()))
}

pub fn bootstrap_with_journal(journal: Arc<dyn DomainJournal>) -> RuntimeHandle {
    RuntimeBootstrap::from_config(FabricConfig::default())
        .expect("default configuration is valid")
        .with_journal(journal)
        .bootstrap()
        .expect("runtime bootstraps")
}

/// Install a contribution with one deployable composite
pub fn install(handle: &RuntimeHandle, contribution: &str, composite: Composite) {
    handle
        .contributions
        .install(Contribution::new(contribution).with_deployable(composite))
        .expect("contribution installs");
}

/// A composite of eager `rust` components with the given names
pub fn composite_of(name: &QName, contribution: &str, components: &[&str]) -> Composite {
    components.iter().fold(
        Composite::new(name.clone(), contribution),
        |composite, component| {
            composite.with_component(ComponentDefinition::atomic(*component, "rust").eager())
        },
    )
}

/// Shared log of executed commands, as `describe()` strings
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<String>>>);

impl CommandLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == entry)
    }
}

/// Wraps a real executor, records every command and optionally fails one
pub struct RecordingExecutor {
    inner: Arc<dyn CommandExecutor>,
    log: CommandLog,
    fail_on: Option<String>,
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    fn command_type(&self) -> CommandType {
        self.inner.command_type()
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let description = command.describe();
        if self.fail_on.as_deref() == Some(description.as_str()) {
            return Err(ExecutionError::Failed(format!("injected failure: {description}")));
        }
        self.inner.execute(command).await?;
        self.log.0.lock().push(description);
        Ok(())
    }
}

/// Wrap every registered executor with a recording one
///
/// The command whose description equals `fail_on` fails without being
/// applied or recorded.
pub fn record_commands(handle: &RuntimeHandle, fail_on: Option<&str>) -> CommandLog {
    let log = CommandLog::default();
    for command_type in CommandType::ALL {
        let inner = handle
            .registry
            .get(command_type)
            .expect("bootstrapped registry is complete");
        handle.registry.register(
            command_type,
            Arc::new(RecordingExecutor {
                inner,
                log: log.clone(),
                fail_on: fail_on.map(str::to_string),
            }),
        );
    }
    log
}

/// One-shot pause point on a single command
///
/// The first execution of the gated command signals `reached`, waits for
/// `release`, then either fails or runs the real executor. Later executions
/// pass straight through.
pub struct Gate {
    pub reached: Notify,
    pub release: Notify,
    armed: AtomicBool,
    fail: bool,
}

struct GatedExecutor {
    inner: Arc<dyn CommandExecutor>,
    description: String,
    gate: Arc<Gate>,
}

#[async_trait]
impl CommandExecutor for GatedExecutor {
    fn command_type(&self) -> CommandType {
        self.inner.command_type()
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        if command.describe() == self.description
            && self.gate.armed.swap(false, Ordering::SeqCst)
        {
            self.gate.reached.notify_one();
            self.gate.release.notified().await;
            if self.gate.fail {
                return Err(ExecutionError::Failed(format!(
                    "gated failure: {}",
                    self.description
                )));
            }
        }
        self.inner.execute(command).await
    }
}

/// Pause the first execution of the command described by `description`
pub fn gate_command(
    handle: &RuntimeHandle,
    command_type: CommandType,
    description: &str,
    fail: bool,
) -> Arc<Gate> {
    let gate = Arc::new(Gate {
        reached: Notify::new(),
        release: Notify::new(),
        armed: AtomicBool::new(true),
        fail,
    });
    let inner = handle
        .registry
        .get(command_type)
        .expect("bootstrapped registry is complete");
    handle.registry.register(
        command_type,
        Arc::new(GatedExecutor {
            inner,
            description: description.to_string(),
            gate: Arc::clone(&gate),
        }),
    );
    gate
}
