use super::{unexpected, CommandExecutor, ExecutionError};
use crate::command::{ChannelAction, Command, CommandType};
use crate::runtime::ChannelManager;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Builds and disposes channels and attaches or detaches their connections
pub struct ChannelConnectionExecutor {
    channels: Arc<dyn ChannelManager>,
}

impl ChannelConnectionExecutor {
    pub fn new(channels: Arc<dyn ChannelManager>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl CommandExecutor for ChannelConnectionExecutor {
    fn command_type(&self) -> CommandType {
        CommandType::ChannelConnection
    }

    async fn execute(&self, command: &Command) -> Result<(), ExecutionError> {
        let Command::ChannelConnection(action) = command else {
            return Err(unexpected(self.command_type(), command));
        };
        match action {
            ChannelAction::BuildChannel { channel } => self.channels.build_channel(channel)?,
            ChannelAction::DisposeChannel { channel } => {
                self.channels.dispose_channel(&channel.uri)?
            }
            ChannelAction::Attach { connection } => self.channels.attach(connection)?,
            ChannelAction::Detach { connection } => self.channels.detach(connection)?,
        }
        debug!(action = %command.describe(), "Applied channel action");
        Ok(())
    }
}
