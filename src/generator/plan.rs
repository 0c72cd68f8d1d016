use crate::command::{
    ChannelAction, Command, PhysicalChannel, PhysicalComponent, PhysicalConnection,
    PhysicalResource,
};
use std::collections::BTreeSet;

/// Commands collected for one zone, grouped by phase
#[derive(Debug, Default)]
pub(super) struct ZonePlan {
    pub detach: Vec<PhysicalConnection>,
    pub dispose_components: Vec<PhysicalComponent>,
    pub dispose_channels: Vec<PhysicalChannel>,
    pub dispose_resources: Vec<PhysicalResource>,
    pub detach_extensions: Vec<(String, String)>,
    pub unprovision_modules: Vec<String>,
    pub unprovision_extensions: BTreeSet<String>,
    pub provision_extensions: BTreeSet<String>,
    pub provision_modules: Vec<String>,
    pub attach_extensions: Vec<(String, String)>,
    pub build_resources: Vec<PhysicalResource>,
    pub build_channels: Vec<PhysicalChannel>,
    pub build_components: Vec<PhysicalComponent>,
    pub attach: Vec<PhysicalConnection>,
    pub start: Vec<String>,

    /// Contributions with components already deployed and staying in the zone
    pub retained_modules: BTreeSet<String>,
    pub incoming_modules: BTreeSet<String>,
    pub outgoing_modules: BTreeSet<String>,
}

impl ZonePlan {
    pub fn into_commands(self) -> Vec<Command> {
        let mut commands = Vec::new();

        commands.extend(self.detach.into_iter().map(|connection| {
            Command::ChannelConnection(ChannelAction::Detach { connection })
        }));
        commands.extend(
            self.dispose_components
                .into_iter()
                .map(Command::DisposeComponent),
        );
        commands.extend(self.dispose_channels.into_iter().map(|channel| {
            Command::ChannelConnection(ChannelAction::DisposeChannel { channel })
        }));
        if !self.dispose_resources.is_empty() {
            commands.push(Command::DisposeResources {
                resources: self.dispose_resources,
            });
        }
        commands.extend(
            self.detach_extensions
                .into_iter()
                .map(|(contribution, provider)| Command::DetachExtension {
                    contribution,
                    provider,
                }),
        );
        commands.extend(
            self.unprovision_modules
                .into_iter()
                .map(|contribution| Command::UnprovisionClassloader { contribution }),
        );
        if !self.unprovision_extensions.is_empty() {
            commands.push(Command::UnProvisionExtensions {
                extensions: self.unprovision_extensions.into_iter().collect(),
            });
        }

        if !self.provision_extensions.is_empty() {
            commands.push(Command::ProvisionExtensions {
                extensions: self.provision_extensions.into_iter().collect(),
            });
        }
        commands.extend(
            self.provision_modules
                .into_iter()
                .map(|contribution| Command::ProvisionClassloader { contribution }),
        );
        commands.extend(
            self.attach_extensions
                .into_iter()
                .map(|(contribution, provider)| Command::AttachExtension {
                    contribution,
                    provider,
                }),
        );
        if !self.build_resources.is_empty() {
            commands.push(Command::BuildResources {
                resources: self.build_resources,
            });
        }
        commands.extend(self.build_channels.into_iter().map(|channel| {
            Command::ChannelConnection(ChannelAction::BuildChannel { channel })
        }));
        commands.extend(self.build_components.into_iter().map(Command::BuildComponent));
        commands.extend(self.attach.into_iter().map(|connection| {
            Command::ChannelConnection(ChannelAction::Attach { connection })
        }));
        commands.extend(
            self.start
                .into_iter()
                .map(|uri| Command::StartComponent { uri }),
        );

        commands
    }
}
