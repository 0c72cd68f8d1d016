use super::{
    child_uri, LogicalCompositeComponent, LogicalConsumer, LogicalProducer, LogicalReference,
    LogicalService, LogicalState,
};
use crate::constants::UNASSIGNED_ZONE;
use crate::definition::{ComponentDefinition, QName};
use std::sync::Arc;

/// A component instance in the logical model
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalComponent {
    uri: String,
    parent: Option<String>,
    definition: Arc<ComponentDefinition>,
    contribution: String,
    pub deployable: Option<QName>,
    pub zone: String,
    pub state: LogicalState,
    pub services: Vec<LogicalService>,
    pub references: Vec<LogicalReference>,
    pub producers: Vec<LogicalProducer>,
    pub consumers: Vec<LogicalConsumer>,
}

impl LogicalComponent {
    /// Create a component named after its definition under `parent`
    pub fn new(
        parent: &str,
        definition: Arc<ComponentDefinition>,
        contribution: impl Into<String>,
        deployable: Option<QName>,
    ) -> Self {
        let uri = child_uri(parent, &definition.name);
        Self::with_uri(uri, Some(parent.to_string()), definition, contribution, deployable)
    }

    pub(crate) fn with_uri(
        uri: String,
        parent: Option<String>,
        definition: Arc<ComponentDefinition>,
        contribution: impl Into<String>,
        deployable: Option<QName>,
    ) -> Self {
        Self {
            uri,
            parent,
            definition,
            contribution: contribution.into(),
            deployable,
            zone: UNASSIGNED_ZONE.to_string(),
            state: LogicalState::New,
            services: Vec::new(),
            references: Vec::new(),
            producers: Vec::new(),
            consumers: Vec::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn definition(&self) -> &Arc<ComponentDefinition> {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn contribution(&self) -> &str {
        &self.contribution
    }

    pub fn service(&self, name: &str) -> Option<&LogicalService> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn reference(&self, name: &str) -> Option<&LogicalReference> {
        self.references.iter().find(|r| r.name == name)
    }

    pub fn reference_mut(&mut self, name: &str) -> Option<&mut LogicalReference> {
        self.references.iter_mut().find(|r| r.name == name)
    }

    pub fn belongs_to(&self, deployables: &[QName]) -> bool {
        self.deployable
            .as_ref()
            .is_some_and(|d| deployables.contains(d))
    }
}

/// A child of a composite: either a leaf component or a nested composite
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalNode {
    Atomic(LogicalComponent),
    Composite(LogicalCompositeComponent),
}

impl LogicalNode {
    pub fn component(&self) -> &LogicalComponent {
        match self {
            LogicalNode::Atomic(component) => component,
            LogicalNode::Composite(composite) => composite.component(),
        }
    }

    pub fn component_mut(&mut self) -> &mut LogicalComponent {
        match self {
            LogicalNode::Atomic(component) => component,
            LogicalNode::Composite(composite) => composite.component_mut(),
        }
    }

    pub fn uri(&self) -> &str {
        self.component().uri()
    }

    pub fn as_composite(&self) -> Option<&LogicalCompositeComponent> {
        match self {
            LogicalNode::Composite(composite) => Some(composite),
            LogicalNode::Atomic(_) => None,
        }
    }
}
