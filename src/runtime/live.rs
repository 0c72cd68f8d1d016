use super::{
    ChannelManager, ComponentManager, ContextRegistry, ExtensionProvisioner, ModuleRegistry,
    ResourceRegistry, RuntimeError,
};
use crate::command::{PhysicalChannel, PhysicalComponent, PhysicalConnection, PhysicalResource};
use crate::definition::QName;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone)]
struct LiveComponent {
    definition: PhysicalComponent,
    started: bool,
}

#[derive(Debug, Clone)]
struct LiveChannel {
    deployable: QName,
    connections: HashSet<PhysicalConnection>,
}

/// In-memory state of one process: modules, extensions, components,
/// channels, resources and execution contexts
#[derive(Debug, Default)]
pub struct LiveRuntime {
    /// module -> parent modules
    modules: RwLock<HashMap<String, BTreeSet<String>>>,
    extensions: DashMap<String, DateTime<Utc>>,
    components: DashMap<String, LiveComponent>,
    channels: DashMap<String, LiveChannel>,
    resources: DashMap<String, PhysicalResource>,
    contexts: DashMap<QName, DateTime<Utc>>,
}

impl LiveRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component_uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.components.iter().map(|e| e.key().clone()).collect();
        uris.sort();
        uris
    }

    pub fn component(&self, uri: &str) -> Option<PhysicalComponent> {
        self.components.get(uri).map(|c| c.definition.clone())
    }

    pub fn is_started(&self, uri: &str) -> bool {
        self.components.get(uri).is_some_and(|c| c.started)
    }

    pub fn has_channel(&self, uri: &str) -> bool {
        self.channels.contains_key(uri)
    }

    pub fn channel_deployable(&self, uri: &str) -> Option<QName> {
        self.channels.get(uri).map(|c| c.deployable.clone())
    }

    pub fn connections(&self, channel: &str) -> Vec<PhysicalConnection> {
        let mut connections: Vec<PhysicalConnection> = self
            .channels
            .get(channel)
            .map(|c| c.connections.iter().cloned().collect())
            .unwrap_or_default();
        connections.sort_by(|a, b| a.source.cmp(&b.source));
        connections
    }

    pub fn module_parents(&self, module: &str) -> Vec<String> {
        self.modules
            .read()
            .get(module)
            .map(|parents| parents.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn active_contexts(&self) -> Vec<QName> {
        let mut contexts: Vec<QName> = self.contexts.iter().map(|e| e.key().clone()).collect();
        contexts.sort();
        contexts
    }

    /// True when nothing is deployed
    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
            && self.components.is_empty()
            && self.channels.is_empty()
            && self.resources.is_empty()
            && self.contexts.is_empty()
    }
}

impl ModuleRegistry for LiveRuntime {
    fn provision_module(&self, contribution: &str) -> Result<(), RuntimeError> {
        self.modules
            .write()
            .entry(contribution.to_string())
            .or_default();
        debug!(module = %contribution, "Provisioned module");
        Ok(())
    }

    fn release_module(&self, contribution: &str) -> Result<(), RuntimeError> {
        if self.modules.write().remove(contribution).is_some() {
            debug!(module = %contribution, "Released module");
        }
        Ok(())
    }

    fn add_parent(&self, module: &str, parent: &str) -> Result<(), RuntimeError> {
        let mut modules = self.modules.write();
        if !modules.contains_key(parent) {
            return Err(RuntimeError::ModuleNotFound {
                module: parent.to_string(),
            });
        }
        let parents = modules
            .get_mut(module)
            .ok_or_else(|| RuntimeError::ModuleNotFound {
                module: module.to_string(),
            })?;
        parents.insert(parent.to_string());
        Ok(())
    }

    fn remove_parent(&self, module: &str, parent: &str) -> Result<(), RuntimeError> {
        if let Some(parents) = self.modules.write().get_mut(module) {
            parents.remove(parent);
        }
        Ok(())
    }

    fn has_module(&self, module: &str) -> bool {
        self.modules.read().contains_key(module)
    }

    fn is_visible(&self, module: &str, target: &str) -> bool {
        let modules = self.modules.read();
        let mut pending = vec![module.to_string()];
        let mut seen = HashSet::new();
        while let Some(current) = pending.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(parents) = modules.get(&current) {
                pending.extend(parents.iter().cloned());
            }
        }
        false
    }
}

impl ExtensionProvisioner for LiveRuntime {
    fn provision_extension(&self, extension: &str) -> Result<(), RuntimeError> {
        self.modules
            .write()
            .entry(extension.to_string())
            .or_default();
        self.extensions.insert(extension.to_string(), Utc::now());
        debug!(extension = %extension, "Provisioned extension");
        Ok(())
    }

    fn unprovision_extension(&self, extension: &str) -> Result<(), RuntimeError> {
        let mut modules = self.modules.write();
        let dependents: Vec<String> = modules
            .iter()
            .filter(|(_, parents)| parents.contains(extension))
            .map(|(module, _)| module.clone())
            .collect();
        if !dependents.is_empty() {
            return Err(RuntimeError::ExtensionInUse {
                extension: extension.to_string(),
                dependents,
            });
        }
        modules.remove(extension);
        self.extensions.remove(extension);
        debug!(extension = %extension, "Un-provisioned extension");
        Ok(())
    }

    fn is_extension_provisioned(&self, extension: &str) -> bool {
        self.extensions.contains_key(extension)
    }
}

impl ComponentManager for LiveRuntime {
    fn build_component(&self, component: &PhysicalComponent) -> Result<(), RuntimeError> {
        if self.components.contains_key(&component.uri) {
            return Err(RuntimeError::DuplicateComponent {
                uri: component.uri.clone(),
            });
        }
        self.components.insert(
            component.uri.clone(),
            LiveComponent {
                definition: component.clone(),
                started: false,
            },
        );
        Ok(())
    }

    fn dispose_component(&self, uri: &str) -> Result<(), RuntimeError> {
        self.components.remove(uri);
        Ok(())
    }

    fn start_component(&self, uri: &str) -> Result<(), RuntimeError> {
        let mut component =
            self.components
                .get_mut(uri)
                .ok_or_else(|| RuntimeError::ComponentNotFound {
                    uri: uri.to_string(),
                })?;
        component.started = true;
        Ok(())
    }

    fn has_component(&self, uri: &str) -> bool {
        self.components.contains_key(uri)
    }
}

impl ContextRegistry for LiveRuntime {
    fn start_context(&self, deployable: &QName) -> Result<(), RuntimeError> {
        self.contexts.insert(deployable.clone(), Utc::now());
        Ok(())
    }

    fn stop_context(&self, deployable: &QName) -> Result<(), RuntimeError> {
        self.contexts.remove(deployable);
        Ok(())
    }

    fn is_context_active(&self, deployable: &QName) -> bool {
        self.contexts.contains_key(deployable)
    }
}

impl ChannelManager for LiveRuntime {
    fn build_channel(&self, channel: &PhysicalChannel) -> Result<(), RuntimeError> {
        if self.channels.contains_key(&channel.uri) {
            return Err(RuntimeError::DuplicateChannel {
                uri: channel.uri.clone(),
            });
        }
        self.channels.insert(
            channel.uri.clone(),
            LiveChannel {
                deployable: channel.deployable.clone(),
                connections: HashSet::new(),
            },
        );
        Ok(())
    }

    fn dispose_channel(&self, uri: &str) -> Result<(), RuntimeError> {
        self.channels.remove(uri);
        Ok(())
    }

    fn attach(&self, connection: &PhysicalConnection) -> Result<(), RuntimeError> {
        let mut channel =
            self.channels
                .get_mut(&connection.channel)
                .ok_or_else(|| RuntimeError::ChannelNotFound {
                    uri: connection.channel.clone(),
                })?;
        channel.connections.insert(connection.clone());
        Ok(())
    }

    fn detach(&self, connection: &PhysicalConnection) -> Result<(), RuntimeError> {
        if let Some(mut channel) = self.channels.get_mut(&connection.channel) {
            channel.connections.remove(connection);
        }
        Ok(())
    }
}

impl ResourceRegistry for LiveRuntime {
    fn register_resource(&self, resource: &PhysicalResource) -> Result<(), RuntimeError> {
        if self.resources.contains_key(&resource.uri) {
            return Err(RuntimeError::DuplicateResource {
                uri: resource.uri.clone(),
            });
        }
        self.resources.insert(resource.uri.clone(), resource.clone());
        Ok(())
    }

    fn unregister_resource(&self, uri: &str) -> Result<(), RuntimeError> {
        self.resources.remove(uri);
        Ok(())
    }

    fn has_resource(&self, uri: &str) -> bool {
        self.resources.contains_key(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ConnectionDirection;

    #[test]
    fn test_module_visibility_through_extensions() {
        let runtime = LiveRuntime::new();
        runtime.provision_extension("ext").unwrap();
        runtime.provision_extension("base").unwrap();
        runtime.provision_module("app").unwrap();
        runtime.add_parent("app", "ext").unwrap();
        runtime.add_parent("ext", "base").unwrap();

        assert!(runtime.is_visible("app", "base"));
        assert!(!runtime.is_visible("base", "app"));

        runtime.remove_parent("app", "ext").unwrap();
        assert!(!runtime.is_visible("app", "ext"));
    }

    #[test]
    fn test_attach_requires_both_modules() {
        let runtime = LiveRuntime::new();
        runtime.provision_module("app").unwrap();
        assert_eq!(
            runtime.add_parent("app", "ext"),
            Err(RuntimeError::ModuleNotFound {
                module: "ext".to_string()
            })
        );
    }

    #[test]
    fn test_extension_in_use_cannot_be_removed() {
        let runtime = LiveRuntime::new();
        runtime.provision_extension("ext").unwrap();
        runtime.provision_module("app").unwrap();
        runtime.add_parent("app", "ext").unwrap();

        assert!(matches!(
            runtime.unprovision_extension("ext"),
            Err(RuntimeError::ExtensionInUse { .. })
        ));
        runtime.remove_parent("app", "ext").unwrap();
        runtime.unprovision_extension("ext").unwrap();
        assert!(!runtime.is_extension_provisioned("ext"));
    }

    #[test]
    fn test_channel_connections() {
        let runtime = LiveRuntime::new();
        let connection = PhysicalConnection {
            source: "fabric3://domain/a#out".to_string(),
            channel: "fabric3://domain/events".to_string(),
            direction: ConnectionDirection::Produce,
        };
        assert!(matches!(
            runtime.attach(&connection),
            Err(RuntimeError::ChannelNotFound { .. })
        ));

        runtime
            .build_channel(&PhysicalChannel {
                uri: "fabric3://domain/events".to_string(),
                deployable: QName::new("urn:test", "bar"),
            })
            .unwrap();
        runtime.attach(&connection).unwrap();
        assert_eq!(runtime.connections("fabric3://domain/events"), vec![connection.clone()]);

        runtime.detach(&connection).unwrap();
        assert!(runtime.connections("fabric3://domain/events").is_empty());
    }

    #[test]
    fn test_dispose_absent_component_is_ok() {
        let runtime = LiveRuntime::new();
        assert!(runtime.dispose_component("fabric3://domain/ghost").is_ok());
        assert!(matches!(
            runtime.start_component("fabric3://domain/ghost"),
            Err(RuntimeError::ComponentNotFound { .. })
        ));
        assert!(runtime.is_empty());
    }
}
