use super::{
    component_of, is_descendant_uri, LogicalChannel, LogicalComponent, LogicalNode,
    LogicalResource, LogicalService, LogicalState, LogicalWire, ModelError,
};
use crate::definition::{ComponentDefinition, Composite, QName};
use std::sync::Arc;

/// A composite component owning child components, channels, resources and wires
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalCompositeComponent {
    component: LogicalComponent,
    autowire: bool,
    components: Vec<LogicalNode>,
    channels: Vec<LogicalChannel>,
    resources: Vec<LogicalResource>,
    wires: Vec<LogicalWire>,
}

impl LogicalCompositeComponent {
    /// Create the domain root composite
    pub fn domain(uri: &str) -> Self {
        let definition = Arc::new(ComponentDefinition::composite(
            "domain",
            Arc::new(Composite::new(QName::new("", "domain"), "")),
        ));
        let mut component =
            LogicalComponent::with_uri(uri.to_string(), None, definition, "", None);
        component.state = LogicalState::Provisioned;
        Self::new(component, true)
    }

    pub fn new(component: LogicalComponent, autowire: bool) -> Self {
        Self {
            component,
            autowire,
            components: Vec::new(),
            channels: Vec::new(),
            resources: Vec::new(),
            wires: Vec::new(),
        }
    }

    pub fn uri(&self) -> &str {
        self.component.uri()
    }

    pub fn component(&self) -> &LogicalComponent {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut LogicalComponent {
        &mut self.component
    }

    pub fn autowire(&self) -> bool {
        self.autowire
    }

    pub fn components(&self) -> &[LogicalNode] {
        &self.components
    }

    pub fn channels(&self) -> &[LogicalChannel] {
        &self.channels
    }

    pub fn resources(&self) -> &[LogicalResource] {
        &self.resources
    }

    pub fn wires(&self) -> &[LogicalWire] {
        &self.wires
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
            && self.channels.is_empty()
            && self.resources.is_empty()
            && self.wires.is_empty()
    }

    pub fn add_component(&mut self, node: LogicalNode) -> Result<(), ModelError> {
        let uri = node.uri().to_string();
        self.check_child(node.component().parent(), &uri)?;
        if self.components.iter().any(|c| c.uri() == uri) {
            return Err(ModelError::DuplicateUri {
                parent: self.uri().to_string(),
                uri,
            });
        }
        self.components.push(node);
        Ok(())
    }

    pub fn add_channel(&mut self, channel: LogicalChannel) -> Result<(), ModelError> {
        self.check_child(Some(&channel.parent), &channel.uri)?;
        if self.channels.iter().any(|c| c.uri == channel.uri) {
            return Err(ModelError::DuplicateUri {
                parent: self.uri().to_string(),
                uri: channel.uri,
            });
        }
        self.channels.push(channel);
        Ok(())
    }

    pub fn add_resource(&mut self, resource: LogicalResource) -> Result<(), ModelError> {
        self.check_child(Some(&resource.parent), &resource.uri)?;
        if self.resources.iter().any(|r| r.uri == resource.uri) {
            return Err(ModelError::DuplicateUri {
                parent: self.uri().to_string(),
                uri: resource.uri,
            });
        }
        self.resources.push(resource);
        Ok(())
    }

    pub fn add_wire(&mut self, wire: LogicalWire) {
        if !self.wires.contains(&wire) {
            self.wires.push(wire);
        }
    }

    fn check_child(&self, parent: Option<&str>, uri: &str) -> Result<(), ModelError> {
        if parent != Some(self.uri()) || !is_descendant_uri(self.uri(), uri) || uri == self.uri() {
            return Err(ModelError::InvalidParent {
                parent: self.uri().to_string(),
                uri: uri.to_string(),
            });
        }
        Ok(())
    }

    /// Look up a component anywhere below this composite
    pub fn get_component(&self, uri: &str) -> Option<&LogicalNode> {
        for node in &self.components {
            if node.uri() == uri {
                return Some(node);
            }
            if let LogicalNode::Composite(composite) = node {
                if is_descendant_uri(composite.uri(), uri) {
                    return composite.get_component(uri);
                }
            }
        }
        None
    }

    pub fn get_component_mut(&mut self, uri: &str) -> Option<&mut LogicalNode> {
        for node in &mut self.components {
            if node.uri() == uri {
                return Some(node);
            }
            if let LogicalNode::Composite(composite) = node {
                if is_descendant_uri(composite.uri(), uri) {
                    return composite.get_component_mut(uri);
                }
            }
        }
        None
    }

    /// This composite or a nested composite with the given URI
    pub fn find_composite(&self, uri: &str) -> Option<&LogicalCompositeComponent> {
        if self.uri() == uri {
            return Some(self);
        }
        self.components.iter().find_map(|node| match node {
            LogicalNode::Composite(composite) if is_descendant_uri(composite.uri(), uri) => {
                composite.find_composite(uri)
            }
            _ => None,
        })
    }

    pub fn find_composite_mut(&mut self, uri: &str) -> Option<&mut LogicalCompositeComponent> {
        if self.uri() == uri {
            return Some(self);
        }
        self.components.iter_mut().find_map(|node| match node {
            LogicalNode::Composite(composite) if is_descendant_uri(composite.uri(), uri) => {
                composite.find_composite_mut(uri)
            }
            _ => None,
        })
    }

    pub fn get_channel(&self, uri: &str) -> Option<&LogicalChannel> {
        self.composites()
            .into_iter()
            .find_map(|composite| composite.channels.iter().find(|c| c.uri == uri))
    }

    pub fn get_service(&self, uri: &str) -> Option<&LogicalService> {
        self.get_component(component_of(uri))?
            .component()
            .services
            .iter()
            .find(|s| s.uri == uri)
    }

    /// This composite followed by every nested composite, depth first
    pub fn composites(&self) -> Vec<&LogicalCompositeComponent> {
        let mut composites = vec![self];
        for node in &self.components {
            if let LogicalNode::Composite(composite) = node {
                composites.extend(composite.composites());
            }
        }
        composites
    }

    /// Every node below this composite, depth first in declaration order
    pub fn descendants(&self) -> Vec<&LogicalNode> {
        let mut nodes = Vec::new();
        for node in &self.components {
            nodes.push(node);
            if let LogicalNode::Composite(composite) = node {
                nodes.extend(composite.descendants());
            }
        }
        nodes
    }

    /// Apply `f` to every component below this composite, nested composites included
    pub fn for_each_component_mut(&mut self, f: &mut dyn FnMut(&mut LogicalComponent)) {
        for node in &mut self.components {
            f(node.component_mut());
            if let LogicalNode::Composite(composite) = node {
                composite.for_each_component_mut(f);
            }
        }
    }

    /// Apply `f` to this composite and every nested composite
    pub fn for_each_composite_mut(&mut self, f: &mut dyn FnMut(&mut LogicalCompositeComponent)) {
        f(self);
        for node in &mut self.components {
            if let LogicalNode::Composite(composite) = node {
                composite.for_each_composite_mut(f);
            }
        }
    }

    pub(crate) fn components_mut(&mut self) -> &mut Vec<LogicalNode> {
        &mut self.components
    }

    pub(crate) fn channels_mut(&mut self) -> &mut Vec<LogicalChannel> {
        &mut self.channels
    }

    pub(crate) fn resources_mut(&mut self) -> &mut Vec<LogicalResource> {
        &mut self.resources
    }

    pub(crate) fn wires_mut(&mut self) -> &mut Vec<LogicalWire> {
        &mut self.wires
    }
}
