//! # Provisioning Commands
//!
//! Typed, serializable provisioning actions produced by the generator and
//! applied by command executors.
//!
//! Every command that changes runtime state has an algebraic inverse computed
//! by [`Command::compensating`]; the deployer applies inverses in reverse order
//! to roll back a partially applied deployment.
//!
//! | Command                  | Compensation              |
//! |--------------------------|---------------------------|
//! | `ProvisionExtensions`    | `UnProvisionExtensions`   |
//! | `ProvisionClassloader`   | `UnprovisionClassloader`  |
//! | `AttachExtension`        | `DetachExtension`         |
//! | `BuildResources`         | `DisposeResources`        |
//! | `ChannelConnection`      | inverse channel action    |
//! | `BuildComponent`         | `DisposeComponent`        |
//! | `StartContext`           | `StopContext`             |
//! | `StartComponent`         | none                      |

mod physical;

pub use physical::{
    ConnectionDirection, PhysicalChannel, PhysicalComponent, PhysicalConnection,
    PhysicalReference, PhysicalResource,
};

use crate::definition::QName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch key for command executors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandType {
    ProvisionExtensions,
    UnProvisionExtensions,
    ProvisionClassloader,
    UnprovisionClassloader,
    AttachExtension,
    DetachExtension,
    BuildResources,
    DisposeResources,
    ChannelConnection,
    BuildComponent,
    DisposeComponent,
    StartComponent,
    StartContext,
    StopContext,
}

impl CommandType {
    /// Every command type; a bootstrapped runtime registers one executor for each
    pub const ALL: [CommandType; 14] = [
        CommandType::ProvisionExtensions,
        CommandType::UnProvisionExtensions,
        CommandType::ProvisionClassloader,
        CommandType::UnprovisionClassloader,
        CommandType::AttachExtension,
        CommandType::DetachExtension,
        CommandType::BuildResources,
        CommandType::DisposeResources,
        CommandType::ChannelConnection,
        CommandType::BuildComponent,
        CommandType::DisposeComponent,
        CommandType::StartComponent,
        CommandType::StartContext,
        CommandType::StopContext,
    ];
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Channel-level actions grouped under one command type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChannelAction {
    BuildChannel { channel: PhysicalChannel },
    DisposeChannel { channel: PhysicalChannel },
    Attach { connection: PhysicalConnection },
    Detach { connection: PhysicalConnection },
}

/// A single provisioning action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    /// Install shared extension modules in the zone
    ProvisionExtensions { extensions: Vec<String> },
    UnProvisionExtensions { extensions: Vec<String> },
    /// Create the code module of a contribution
    ProvisionClassloader { contribution: String },
    UnprovisionClassloader { contribution: String },
    /// Make `provider` visible to the code module of `contribution`
    AttachExtension { contribution: String, provider: String },
    DetachExtension { contribution: String, provider: String },
    BuildResources { resources: Vec<PhysicalResource> },
    DisposeResources { resources: Vec<PhysicalResource> },
    ChannelConnection(ChannelAction),
    BuildComponent(PhysicalComponent),
    DisposeComponent(PhysicalComponent),
    StartComponent { uri: String },
    /// Start the execution contexts of a deployable unit
    StartContext { deployable: QName },
    StopContext { deployable: QName },
}

impl Command {
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::ProvisionExtensions { .. } => CommandType::ProvisionExtensions,
            Command::UnProvisionExtensions { .. } => CommandType::UnProvisionExtensions,
            Command::ProvisionClassloader { .. } => CommandType::ProvisionClassloader,
            Command::UnprovisionClassloader { .. } => CommandType::UnprovisionClassloader,
            Command::AttachExtension { .. } => CommandType::AttachExtension,
            Command::DetachExtension { .. } => CommandType::DetachExtension,
            Command::BuildResources { .. } => CommandType::BuildResources,
            Command::DisposeResources { .. } => CommandType::DisposeResources,
            Command::ChannelConnection(_) => CommandType::ChannelConnection,
            Command::BuildComponent(_) => CommandType::BuildComponent,
            Command::DisposeComponent(_) => CommandType::DisposeComponent,
            Command::StartComponent { .. } => CommandType::StartComponent,
            Command::StartContext { .. } => CommandType::StartContext,
            Command::StopContext { .. } => CommandType::StopContext,
        }
    }

    /// The command that undoes this one, if any
    pub fn compensating(&self) -> Option<Command> {
        let inverse = match self {
            Command::ProvisionExtensions { extensions } => Command::UnProvisionExtensions {
                extensions: extensions.clone(),
            },
            Command::UnProvisionExtensions { extensions } => Command::ProvisionExtensions {
                extensions: extensions.clone(),
            },
            Command::ProvisionClassloader { contribution } => Command::UnprovisionClassloader {
                contribution: contribution.clone(),
            },
            Command::UnprovisionClassloader { contribution } => Command::ProvisionClassloader {
                contribution: contribution.clone(),
            },
            Command::AttachExtension {
                contribution,
                provider,
            } => Command::DetachExtension {
                contribution: contribution.clone(),
                provider: provider.clone(),
            },
            Command::DetachExtension {
                contribution,
                provider,
            } => Command::AttachExtension {
                contribution: contribution.clone(),
                provider: provider.clone(),
            },
            Command::BuildResources { resources } => Command::DisposeResources {
                resources: resources.clone(),
            },
            Command::DisposeResources { resources } => Command::BuildResources {
                resources: resources.clone(),
            },
            Command::ChannelConnection(action) => Command::ChannelConnection(match action {
                ChannelAction::BuildChannel { channel } => ChannelAction::DisposeChannel {
                    channel: channel.clone(),
                },
                ChannelAction::DisposeChannel { channel } => ChannelAction::BuildChannel {
                    channel: channel.clone(),
                },
                ChannelAction::Attach { connection } => ChannelAction::Detach {
                    connection: connection.clone(),
                },
                ChannelAction::Detach { connection } => ChannelAction::Attach {
                    connection: connection.clone(),
                },
            }),
            Command::BuildComponent(component) => Command::DisposeComponent(component.clone()),
            Command::DisposeComponent(component) => Command::BuildComponent(component.clone()),
            Command::StartContext { deployable } => Command::StopContext {
                deployable: deployable.clone(),
            },
            Command::StopContext { deployable } => Command::StartContext {
                deployable: deployable.clone(),
            },
            Command::StartComponent { .. } => return None,
        };
        Some(inverse)
    }

    /// Short human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            Command::ProvisionExtensions { extensions }
            | Command::UnProvisionExtensions { extensions } => {
                format!("{} {:?}", self.command_type(), extensions)
            }
            Command::ProvisionClassloader { contribution }
            | Command::UnprovisionClassloader { contribution } => {
                format!("{} {contribution}", self.command_type())
            }
            Command::AttachExtension {
                contribution,
                provider,
            }
            | Command::DetachExtension {
                contribution,
                provider,
            } => format!("{} {provider} -> {contribution}", self.command_type()),
            Command::BuildResources { resources } | Command::DisposeResources { resources } => {
                format!("{} ({} resources)", self.command_type(), resources.len())
            }
            Command::ChannelConnection(action) => match action {
                ChannelAction::BuildChannel { channel } => format!("BuildChannel {}", channel.uri),
                ChannelAction::DisposeChannel { channel } => {
                    format!("DisposeChannel {}", channel.uri)
                }
                ChannelAction::Attach { connection } => {
                    format!("AttachConnection {} -> {}", connection.source, connection.channel)
                }
                ChannelAction::Detach { connection } => {
                    format!("DetachConnection {} -> {}", connection.source, connection.channel)
                }
            },
            Command::BuildComponent(component) | Command::DisposeComponent(component) => {
                format!("{} {}", self.command_type(), component.uri)
            }
            Command::StartComponent { uri } => format!("StartComponent {uri}"),
            Command::StartContext { deployable } | Command::StopContext { deployable } => {
                format!("{} {deployable}", self.command_type())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component() -> PhysicalComponent {
        PhysicalComponent {
            uri: "fabric3://domain/a".to_string(),
            contribution: "test".to_string(),
            deployable: QName::new("urn:test", "bar"),
            implementation: "rust".to_string(),
            eager_init: false,
            references: Vec::new(),
            properties: Default::default(),
        }
    }

    #[test]
    fn test_build_component_compensates_with_dispose() {
        let build = Command::BuildComponent(component());
        assert_eq!(
            build.compensating(),
            Some(Command::DisposeComponent(component()))
        );
    }

    #[test]
    fn test_compensation_is_an_involution() {
        let commands = vec![
            Command::ProvisionExtensions {
                extensions: vec!["ext".to_string()],
            },
            Command::ProvisionClassloader {
                contribution: "test".to_string(),
            },
            Command::AttachExtension {
                contribution: "test".to_string(),
                provider: "ext".to_string(),
            },
            Command::BuildComponent(component()),
            Command::StartContext {
                deployable: QName::new("urn:test", "bar"),
            },
        ];
        for command in commands {
            let inverse = command.compensating().unwrap();
            assert_ne!(inverse.command_type(), command.command_type());
            assert_eq!(inverse.compensating(), Some(command));
        }
    }

    #[test]
    fn test_start_component_has_no_compensation() {
        let start = Command::StartComponent {
            uri: "fabric3://domain/a".to_string(),
        };
        assert_eq!(start.compensating(), None);
    }

    #[test]
    fn test_channel_actions_share_a_command_type() {
        let channel = PhysicalChannel {
            uri: "fabric3://domain/events".to_string(),
            deployable: QName::new("urn:test", "bar"),
        };
        let build = Command::ChannelConnection(ChannelAction::BuildChannel { channel });
        let dispose = build.compensating().unwrap();
        assert_eq!(build.command_type(), CommandType::ChannelConnection);
        assert_eq!(dispose.command_type(), CommandType::ChannelConnection);
        assert!(matches!(
            dispose,
            Command::ChannelConnection(ChannelAction::DisposeChannel { .. })
        ));
    }
}
