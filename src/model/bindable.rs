use super::{bindable_uri, LogicalState};
use crate::definition::{Multiplicity, QName, ResourceDefinition};
use serde::{Deserialize, Serialize};

/// A service offered by a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalService {
    pub uri: String,
    pub name: String,
    pub contract: String,
}

impl LogicalService {
    pub fn new(component: &str, name: &str, contract: &str) -> Self {
        Self {
            uri: bindable_uri(component, name),
            name: name.to_string(),
            contract: contract.to_string(),
        }
    }
}

/// A component dependency; `targets` hold resolved service URIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalReference {
    pub uri: String,
    pub name: String,
    pub contract: String,
    pub multiplicity: Multiplicity,
    pub autowire: bool,
    pub targets: Vec<String>,
}

impl LogicalReference {
    pub fn new(component: &str, name: &str, contract: &str, multiplicity: Multiplicity) -> Self {
        Self {
            uri: bindable_uri(component, name),
            name: name.to_string(),
            contract: contract.to_string(),
            multiplicity,
            autowire: false,
            targets: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn add_target(&mut self, target: String) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }
}

/// An event producer; `targets` hold resolved channel URIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalProducer {
    pub uri: String,
    pub name: String,
    pub targets: Vec<String>,
}

impl LogicalProducer {
    pub fn new(component: &str, name: &str) -> Self {
        Self {
            uri: bindable_uri(component, name),
            name: name.to_string(),
            targets: Vec::new(),
        }
    }
}

/// An event consumer; `sources` hold resolved channel URIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalConsumer {
    pub uri: String,
    pub name: String,
    pub sources: Vec<String>,
}

impl LogicalConsumer {
    pub fn new(component: &str, name: &str) -> Self {
        Self {
            uri: bindable_uri(component, name),
            name: name.to_string(),
            sources: Vec::new(),
        }
    }
}

/// An event channel owned by a composite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalChannel {
    pub uri: String,
    pub name: String,
    pub parent: String,
    pub deployable: Option<QName>,
    pub contribution: String,
    pub zone: String,
    pub state: LogicalState,
}

/// A shared resource owned by a composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalResource {
    pub uri: String,
    pub definition: ResourceDefinition,
    pub parent: String,
    pub deployable: Option<QName>,
    pub contribution: String,
    pub zone: String,
    pub state: LogicalState,
}

/// Resolved reference-to-service connection
///
/// Wires are values: the generator folds them into component definitions on
/// every pass instead of tracking them as deployed entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalWire {
    pub source: String,
    pub target: String,
    pub deployable: Option<QName>,
    pub state: LogicalState,
}
