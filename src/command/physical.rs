//! Physical definitions carried by commands: everything an executor needs to
//! act on the live process without consulting the logical model.

use crate::definition::QName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Build instructions for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalComponent {
    pub uri: String,
    /// Contribution whose code module must be visible when building
    pub contribution: String,
    pub deployable: QName,
    pub implementation: String,
    pub eager_init: bool,
    /// Resolved dependencies, looked up by the builder at construction time
    pub references: Vec<PhysicalReference>,
    pub properties: BTreeMap<String, String>,
}

/// A dependency with its resolved target service URIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalReference {
    pub name: String,
    pub contract: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalResource {
    pub uri: String,
    pub kind: String,
    pub deployable: QName,
    pub settings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalChannel {
    pub uri: String,
    pub deployable: QName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionDirection {
    /// Producer publishes to the channel
    Produce,
    /// Consumer receives from the channel
    Consume,
}

/// A producer or consumer attached to a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalConnection {
    /// Producer or consumer URI
    pub source: String,
    pub channel: String,
    pub direction: ConnectionDirection,
}
