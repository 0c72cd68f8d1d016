use crate::command::{Command, CommandType};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Transport error: zone {zone} is unreachable: {reason}")]
    Unreachable { zone: String, reason: String },

    #[error("Transport error: zone {zone} rejected {command_type}: {reason}")]
    Rejected {
        zone: String,
        command_type: CommandType,
        reason: String,
    },
}

/// Delivers command batches to remote zones
///
/// The wire format is the transport's concern. A zone either applies the
/// whole batch or reports an error.
#[async_trait]
pub trait ZoneTransport: Send + Sync {
    async fn send(&self, zone: &str, commands: &[Command]) -> Result<(), TransportError>;
}

/// Transport for single-process runtimes: every remote zone is unreachable
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOnlyTransport;

#[async_trait]
impl ZoneTransport for LocalOnlyTransport {
    async fn send(&self, zone: &str, _commands: &[Command]) -> Result<(), TransportError> {
        Err(TransportError::Unreachable {
            zone: zone.to_string(),
            reason: "no transport configured for remote zones".to_string(),
        })
    }
}
