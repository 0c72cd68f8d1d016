use crate::command::{Command, CommandType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered per-zone command batches produced by one generation pass
///
/// Zone batches are applied in zone order. Global commands are not bound to a
/// zone: context stops run before any zone batch and context starts after all
/// of them. The extension claims and releases list the tracker keys this
/// deployment acquires and gives up; the generator never touches the tracker
/// itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    zones: BTreeMap<String, Vec<Command>>,
    global: Vec<Command>,
    extension_claims: Vec<String>,
    extension_releases: Vec<String>,
}

impl Deployment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    pub fn zone_commands(&self, zone: &str) -> &[Command] {
        self.zones.get(zone).map_or(&[], Vec::as_slice)
    }

    pub fn global(&self) -> &[Command] {
        &self.global
    }

    /// Global commands that run before zone batches
    pub fn global_before(&self) -> Vec<&Command> {
        self.global
            .iter()
            .filter(|c| c.command_type() == CommandType::StopContext)
            .collect()
    }

    /// Global commands that run after zone batches
    pub fn global_after(&self) -> Vec<&Command> {
        self.global
            .iter()
            .filter(|c| c.command_type() != CommandType::StopContext)
            .collect()
    }

    pub fn extension_claims(&self) -> &[String] {
        &self.extension_claims
    }

    pub fn extension_releases(&self) -> &[String] {
        &self.extension_releases
    }

    pub fn is_empty(&self) -> bool {
        self.zones.values().all(Vec::is_empty) && self.global.is_empty()
    }

    pub fn command_count(&self) -> usize {
        self.zones.values().map(Vec::len).sum::<usize>() + self.global.len()
    }

    pub(crate) fn add_zone_commands(&mut self, zone: &str, commands: Vec<Command>) {
        if !commands.is_empty() {
            self.zones
                .entry(zone.to_string())
                .or_default()
                .extend(commands);
        }
    }

    pub(crate) fn push_global(&mut self, command: Command) {
        self.global.push(command);
    }

    pub(crate) fn claim_extension(&mut self, key: String) {
        self.extension_claims.push(key);
    }

    pub(crate) fn release_extension(&mut self, key: String) {
        self.extension_releases.push(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::QName;

    #[test]
    fn test_global_phases() {
        let mut deployment = Deployment::new();
        deployment.push_global(Command::StartContext {
            deployable: QName::new("urn:test", "a"),
        });
        deployment.push_global(Command::StopContext {
            deployable: QName::new("urn:test", "b"),
        });

        assert_eq!(deployment.global_before().len(), 1);
        assert_eq!(deployment.global_after().len(), 1);
        assert_eq!(deployment.command_count(), 2);
    }

    #[test]
    fn test_empty_zone_batches_are_dropped() {
        let mut deployment = Deployment::new();
        deployment.add_zone_commands("LocalZone", Vec::new());
        assert!(deployment.is_empty());
        assert_eq!(deployment.zones().count(), 0);
        assert!(deployment.zone_commands("LocalZone").is_empty());
    }
}
