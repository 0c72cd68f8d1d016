//! # Deployer
//!
//! Applies a [`Deployment`] to its zones with all-or-nothing semantics for
//! transactional zones.
//!
//! ## Phases
//!
//! ```text
//! 1. global stop commands   → every participating zone
//! 2. zone batches           → in zone order
//! 3. global start commands  → every participating zone
//! ```
//!
//! Local zone commands run one at a time through the
//! [`CommandExecutorRegistry`]; remote zone batches go through the
//! [`ZoneTransport`]. Each successfully applied command of a transactional
//! zone is pushed onto a single stack spanning the whole deployment.
//!
//! ## Rollback
//!
//! On the first failure the stack is unwound: the compensating command of
//! each applied command runs, most recent first. If a compensation fails the
//! unwinding stops and that failure is reported next to the original cause.
//!
//! Commands applied in non-transactional zones are never pushed, so those
//! zones are not compensated. Transactional zones fully compensate;
//! non-transactional zones do not.

mod transport;

pub use transport::{LocalOnlyTransport, TransportError, ZoneTransport};

use crate::command::{Command, CommandType};
use crate::config::DeployerConfig;
use crate::constants::operations;
use crate::executor::{CommandExecutorRegistry, ExecutionError};
use crate::generator::Deployment;
use crate::logging::log_deployment_operation;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// The deployment to apply, paired with the full desired state of every zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPackage {
    current: Deployment,
    full: Deployment,
}

impl DeploymentPackage {
    pub fn new(current: Deployment, full: Deployment) -> Self {
        Self { current, full }
    }

    pub fn current(&self) -> &Deployment {
        &self.current
    }

    pub fn full(&self) -> &Deployment {
        &self.full
    }
}

/// Why a command could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationFailure {
    pub zone: String,
    pub command_type: CommandType,
    pub cause: FailureCause,
}

impl fmt::Display for CompensationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compensation {} in zone {} failed: {}",
            self.command_type, self.zone, self.cause
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeploymentError {
    #[error(
        "Deployment error: {command_type} failed in zone {zone}: {cause} ({compensated} compensated{})",
        .compensation_error.as_ref().map(|e| format!("; {e}")).unwrap_or_default()
    )]
    Failed {
        zone: String,
        command_type: CommandType,
        cause: FailureCause,
        /// Compensating commands that ran successfully
        compensated: usize,
        compensation_error: Option<CompensationFailure>,
    },
}

impl DeploymentError {
    pub fn cause(&self) -> &FailureCause {
        match self {
            DeploymentError::Failed { cause, .. } => cause,
        }
    }

    pub fn compensation_error(&self) -> Option<&CompensationFailure> {
        match self {
            DeploymentError::Failed {
                compensation_error, ..
            } => compensation_error.as_ref(),
        }
    }
}

struct StepFailure {
    zone: String,
    command_type: CommandType,
    cause: FailureCause,
}

pub struct Deployer {
    registry: Arc<CommandExecutorRegistry>,
    transport: Arc<dyn ZoneTransport>,
    local_zone: String,
    transactional: bool,
    non_transactional_zones: HashSet<String>,
}

impl fmt::Debug for Deployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployer")
            .field("local_zone", &self.local_zone)
            .field("transactional", &self.transactional)
            .field("non_transactional_zones", &self.non_transactional_zones)
            .finish()
    }
}

impl Deployer {
    pub fn new(
        registry: Arc<CommandExecutorRegistry>,
        transport: Arc<dyn ZoneTransport>,
        config: &DeployerConfig,
        local_zone: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            transport,
            local_zone: local_zone.into(),
            transactional: config.transactional,
            non_transactional_zones: config.non_transactional_zones.iter().cloned().collect(),
        }
    }

    pub fn local_zone(&self) -> &str {
        &self.local_zone
    }

    /// Whether failures after commands applied in `zone` compensate them
    pub fn is_transactional(&self, zone: &str) -> bool {
        self.transactional && !self.non_transactional_zones.contains(zone)
    }

    #[instrument(skip_all, fields(deployment_id = %Uuid::new_v4(), commands = package.current().command_count()))]
    pub async fn deploy(&self, package: &DeploymentPackage) -> Result<(), DeploymentError> {
        let current = package.current();
        let zones = self.participating_zones(current);
        let mut applied: Vec<(String, Command)> = Vec::new();

        let outcome = self.apply_all(package, &zones, &mut applied).await;
        let Err(failure) = outcome else {
            log_deployment_operation(
                operations::DEPLOY,
                None,
                None,
                "completed",
                Some(&format!("{} commands", current.command_count())),
            );
            return Ok(());
        };

        error!(
            zone = %failure.zone,
            command = %failure.command_type,
            error = %failure.cause,
            applied = applied.len(),
            "Deployment failed, compensating applied commands"
        );
        let (compensated, compensation_error) = self.compensate(applied).await;
        log_deployment_operation(
            operations::ROLLBACK,
            None,
            Some(&failure.zone),
            if compensation_error.is_some() {
                "incomplete"
            } else {
                "completed"
            },
            Some(&format!("{compensated} compensated")),
        );

        Err(DeploymentError::Failed {
            zone: failure.zone,
            command_type: failure.command_type,
            cause: failure.cause,
            compensated,
            compensation_error,
        })
    }

    fn participating_zones(&self, deployment: &Deployment) -> BTreeSet<String> {
        let mut zones: BTreeSet<String> = deployment.zones().map(str::to_string).collect();
        if zones.is_empty() && !deployment.global().is_empty() {
            zones.insert(self.local_zone.clone());
        }
        zones
    }

    async fn apply_all(
        &self,
        package: &DeploymentPackage,
        zones: &BTreeSet<String>,
        applied: &mut Vec<(String, Command)>,
    ) -> Result<(), StepFailure> {
        let current = package.current();

        let before: Vec<Command> = current.global_before().into_iter().cloned().collect();
        for zone in zones {
            self.apply_batch(zone, &before, applied).await?;
        }

        for zone in zones {
            let commands = if self.is_remote(zone) && !self.is_transactional(zone) {
                let full = package.full().zone_commands(zone);
                if full.is_empty() {
                    current.zone_commands(zone)
                } else {
                    full
                }
            } else {
                current.zone_commands(zone)
            };
            self.apply_batch(zone, commands, applied).await?;
        }

        let after: Vec<Command> = current.global_after().into_iter().cloned().collect();
        for zone in zones {
            self.apply_batch(zone, &after, applied).await?;
        }
        Ok(())
    }

    async fn apply_batch(
        &self,
        zone: &str,
        commands: &[Command],
        applied: &mut Vec<(String, Command)>,
    ) -> Result<(), StepFailure> {
        if commands.is_empty() {
            return Ok(());
        }
        let transactional = self.is_transactional(zone);

        if self.is_remote(zone) {
            debug!(zone = %zone, commands = commands.len(), "Sending batch to remote zone");
            self.transport
                .send(zone, commands)
                .await
                .map_err(|e| StepFailure {
                    zone: zone.to_string(),
                    command_type: failed_type(&e, commands),
                    cause: e.into(),
                })?;
            if transactional {
                applied.extend(commands.iter().map(|c| (zone.to_string(), c.clone())));
            }
            return Ok(());
        }

        for command in commands {
            self.registry
                .execute(command)
                .await
                .map_err(|e| StepFailure {
                    zone: zone.to_string(),
                    command_type: command.command_type(),
                    cause: e.into(),
                })?;
            if transactional {
                applied.push((zone.to_string(), command.clone()));
            }
        }
        Ok(())
    }

    /// Unwind `applied`, returning how many compensations ran and the first
    /// compensation failure
    async fn compensate(
        &self,
        applied: Vec<(String, Command)>,
    ) -> (usize, Option<CompensationFailure>) {
        let mut compensated = 0;
        for (zone, command) in applied.into_iter().rev() {
            let Some(inverse) = command.compensating() else {
                continue;
            };
            let result: Result<(), FailureCause> = if self.is_remote(&zone) {
                self.transport
                    .send(&zone, std::slice::from_ref(&inverse))
                    .await
                    .map_err(Into::into)
            } else {
                self.registry.execute(&inverse).await.map_err(Into::into)
            };

            match result {
                Ok(()) => compensated += 1,
                Err(cause) => {
                    warn!(
                        zone = %zone,
                        command = %inverse.describe(),
                        error = %cause,
                        "Compensation failed, abandoning rollback"
                    );
                    return (
                        compensated,
                        Some(CompensationFailure {
                            zone,
                            command_type: inverse.command_type(),
                            cause,
                        }),
                    );
                }
            }
        }
        (compensated, None)
    }

    fn is_remote(&self, zone: &str) -> bool {
        zone != self.local_zone
    }
}

fn failed_type(error: &TransportError, commands: &[Command]) -> CommandType {
    match error {
        TransportError::Rejected { command_type, .. } => *command_type,
        TransportError::Unreachable { .. } => commands
            .first()
            .map_or(CommandType::StartContext, Command::command_type),
    }
}
