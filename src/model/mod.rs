//! # Logical Model
//!
//! In-memory desired-state graph of the domain: composites, components and
//! their services, references, producers and consumers, channels, shared
//! resources, and wires.
//!
//! ## Structure
//!
//! ```text
//! LogicalCompositeComponent (domain root, fabric3://domain)
//! ├── LogicalNode::Atomic(LogicalComponent)      fabric3://domain/a
//! │   ├── LogicalService                         fabric3://domain/a#svc
//! │   └── LogicalReference ──targets──┐          fabric3://domain/a#ref
//! ├── LogicalNode::Composite(...)                fabric3://domain/c
//! │   └── LogicalNode::Atomic(...)               fabric3://domain/c/b
//! ├── LogicalChannel                             fabric3://domain/events
//! ├── LogicalResource                            fabric3://domain/db
//! └── LogicalWire { source, target } (value)
//! ```
//!
//! Ownership is a strict tree: a composite exclusively owns its children,
//! channels, resources and wires, so dropping a composite drops its subtree.
//! Reference targets and wires are cross-links expressed as URIs and never
//! imply ownership. Every non-root URI is prefixed by its parent's URI.
//!
//! The model has no behavior beyond navigation and invariant checks; it is
//! mutated by the instantiator (new nodes), an allocator (zone assignment),
//! and the collector (state changes and removal).

mod bindable;
mod component;
mod composite;

pub use bindable::{
    LogicalChannel, LogicalConsumer, LogicalProducer, LogicalReference, LogicalResource,
    LogicalService, LogicalWire,
};
pub use component::{LogicalComponent, LogicalNode};
pub use composite::LogicalCompositeComponent;

use crate::constants::BINDABLE_SEPARATOR;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provisioning state of a logical node, driving incremental generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalState {
    /// Created by the instantiator and not yet deployed
    New,
    /// Deployed to its zone
    Provisioned,
    /// Scheduled for removal by an undeploy in progress
    MarkedForDeletion,
}

/// Violations of the model's structural invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Node {uri} is not a child of composite {parent}")]
    InvalidParent { parent: String, uri: String },

    #[error("Duplicate URI in composite {parent}: {uri}")]
    DuplicateUri { parent: String, uri: String },
}

/// URI of a child named `name` under `parent`
pub fn child_uri(parent: &str, name: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), name)
}

/// URI of a service, reference, producer or consumer of a component
pub fn bindable_uri(component: &str, name: &str) -> String {
    format!("{component}{BINDABLE_SEPARATOR}{name}")
}

/// Component URI part of a bindable URI
pub fn component_of(bindable: &str) -> &str {
    bindable
        .split_once(BINDABLE_SEPARATOR)
        .map_or(bindable, |(component, _)| component)
}

/// True when `uri` is `parent` itself or lies strictly below it
pub fn is_descendant_uri(parent: &str, uri: &str) -> bool {
    uri == parent
        || uri
            .strip_prefix(parent)
            .is_some_and(|rest| rest.starts_with('/') || rest.starts_with(BINDABLE_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_helpers() {
        assert_eq!(child_uri("fabric3://domain", "a"), "fabric3://domain/a");
        assert_eq!(child_uri("fabric3://domain/", "a"), "fabric3://domain/a");
        assert_eq!(bindable_uri("fabric3://domain/a", "svc"), "fabric3://domain/a#svc");
        assert_eq!(component_of("fabric3://domain/a#svc"), "fabric3://domain/a");
        assert_eq!(component_of("fabric3://domain/a"), "fabric3://domain/a");
    }

    #[test]
    fn test_descendant_check_respects_segment_boundaries() {
        assert!(is_descendant_uri("fabric3://domain", "fabric3://domain/a"));
        assert!(is_descendant_uri("fabric3://domain/a", "fabric3://domain/a#svc"));
        assert!(!is_descendant_uri("fabric3://domain/a", "fabric3://domain/ab"));
    }
}
