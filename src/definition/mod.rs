//! # Composite Definitions
//!
//! The already-parsed declarative input to the pipeline. Textual formats are
//! handled elsewhere; this module only describes the object graph the
//! instantiator consumes.
//!
//! ## Overview
//!
//! A [`Composite`] is the declarable unit. It lives in a contribution, declares
//! components, channels and shared resources, and may include other composites
//! whose contents are merged into it. Components either have an atomic
//! implementation (built by an implementation-specific generator) or are
//! themselves implemented by a composite, which yields a nested logical
//! composite.
//!
//! Dependencies between components are declared explicitly through
//! [`ReferenceDefinition`] records (a named dependency with a target contract),
//! never discovered by introspection.

mod qname;

pub use qname::QName;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A declarable composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composite {
    /// Composite name; also the name of the deployable unit it defines
    pub name: QName,
    /// URI of the contribution that contains this composite
    pub contribution: String,
    /// Default autowire setting for references declared in this composite
    pub autowire: bool,
    pub components: Vec<ComponentDefinition>,
    pub channels: Vec<ChannelDefinition>,
    pub resources: Vec<ResourceDefinition>,
    pub wires: Vec<WireDefinition>,
    /// Composites whose contents are merged into this one
    pub includes: Vec<Arc<Composite>>,
}

impl Composite {
    pub fn new(name: QName, contribution: impl Into<String>) -> Self {
        Self {
            name,
            contribution: contribution.into(),
            autowire: true,
            components: Vec::new(),
            channels: Vec::new(),
            resources: Vec::new(),
            wires: Vec::new(),
            includes: Vec::new(),
        }
    }

    pub fn with_autowire(mut self, autowire: bool) -> Self {
        self.autowire = autowire;
        self
    }

    pub fn with_component(mut self, component: ComponentDefinition) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_channel(mut self, channel: ChannelDefinition) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn with_resource(mut self, resource: ResourceDefinition) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_wire(mut self, wire: WireDefinition) -> Self {
        self.wires.push(wire);
        self
    }

    pub fn with_include(mut self, include: Arc<Composite>) -> Self {
        self.includes.push(include);
        self
    }

    /// Components declared directly or through included composites, in
    /// declaration order (own components first).
    pub fn all_components(&self) -> Vec<&ComponentDefinition> {
        let mut components: Vec<&ComponentDefinition> = self.components.iter().collect();
        for include in &self.includes {
            components.extend(include.all_components());
        }
        components
    }

    pub fn all_channels(&self) -> Vec<&ChannelDefinition> {
        let mut channels: Vec<&ChannelDefinition> = self.channels.iter().collect();
        for include in &self.includes {
            channels.extend(include.all_channels());
        }
        channels
    }

    pub fn all_resources(&self) -> Vec<&ResourceDefinition> {
        let mut resources: Vec<&ResourceDefinition> = self.resources.iter().collect();
        for include in &self.includes {
            resources.extend(include.all_resources());
        }
        resources
    }

    pub fn all_wires(&self) -> Vec<&WireDefinition> {
        let mut wires: Vec<&WireDefinition> = self.wires.iter().collect();
        for include in &self.includes {
            wires.extend(include.all_wires());
        }
        wires
    }
}

/// How a component is implemented
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Implementation {
    /// Leaf implementation; `kind` selects the component generator
    Atomic { kind: String },
    /// Implemented by a composite, producing a nested logical composite
    Composite(Arc<Composite>),
}

/// A declared component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub name: String,
    pub implementation: Implementation,
    pub services: Vec<ServiceDefinition>,
    pub references: Vec<ReferenceDefinition>,
    pub producers: Vec<ProducerDefinition>,
    pub consumers: Vec<ConsumerDefinition>,
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Start the component as soon as its deployable is started
    pub eager_init: bool,
    /// Preferred zone, honored by allocators that support placement hints
    #[serde(default)]
    pub zone_hint: Option<String>,
}

impl ComponentDefinition {
    pub fn atomic(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(name, Implementation::Atomic { kind: kind.into() })
    }

    pub fn composite(name: impl Into<String>, composite: Arc<Composite>) -> Self {
        Self::new(name, Implementation::Composite(composite))
    }

    fn new(name: impl Into<String>, implementation: Implementation) -> Self {
        Self {
            name: name.into(),
            implementation,
            services: Vec::new(),
            references: Vec::new(),
            producers: Vec::new(),
            consumers: Vec::new(),
            properties: BTreeMap::new(),
            eager_init: false,
            zone_hint: None,
        }
    }

    pub fn with_service(mut self, name: impl Into<String>, contract: impl Into<String>) -> Self {
        self.services.push(ServiceDefinition {
            name: name.into(),
            contract: contract.into(),
        });
        self
    }

    pub fn with_reference(mut self, reference: ReferenceDefinition) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_producer(mut self, producer: ProducerDefinition) -> Self {
        self.producers.push(producer);
        self
    }

    pub fn with_consumer(mut self, consumer: ConsumerDefinition) -> Self {
        self.consumers.push(consumer);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn eager(mut self) -> Self {
        self.eager_init = true;
        self
    }

    pub fn with_zone_hint(mut self, zone: impl Into<String>) -> Self {
        self.zone_hint = Some(zone.into());
        self
    }

    /// Implementation kind used to select a generator; composites report `composite`
    pub fn implementation_kind(&self) -> &str {
        match &self.implementation {
            Implementation::Atomic { kind } => kind,
            Implementation::Composite(_) => "composite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub contract: String,
}

/// Reference multiplicity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplicity {
    /// `0..1`
    ZeroOne,
    /// `1..1`
    OneOne,
    /// `0..n`
    ZeroN,
    /// `1..n`
    OneN,
}

impl Multiplicity {
    pub fn is_required(self) -> bool {
        matches!(self, Multiplicity::OneOne | Multiplicity::OneN)
    }

    pub fn is_single(self) -> bool {
        matches!(self, Multiplicity::ZeroOne | Multiplicity::OneOne)
    }
}

/// A named dependency of a component on a service contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDefinition {
    pub name: String,
    pub contract: String,
    pub multiplicity: Multiplicity,
    /// Explicit targets: `component` or `component/service`
    pub targets: Vec<String>,
    /// Overrides the composite autowire default when set
    pub autowire: Option<bool>,
}

impl ReferenceDefinition {
    pub fn new(name: impl Into<String>, contract: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contract: contract.into(),
            multiplicity: Multiplicity::OneOne,
            targets: Vec::new(),
            autowire: None,
        }
    }

    pub fn with_multiplicity(mut self, multiplicity: Multiplicity) -> Self {
        self.multiplicity = multiplicity;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn with_autowire(mut self, autowire: bool) -> Self {
        self.autowire = Some(autowire);
        self
    }
}

/// Event producer; targets name channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerDefinition {
    pub name: String,
    pub targets: Vec<String>,
}

impl ProducerDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, channel: impl Into<String>) -> Self {
        self.targets.push(channel.into());
        self
    }
}

/// Event consumer; sources name channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerDefinition {
    pub name: String,
    pub sources: Vec<String>,
}

impl ConsumerDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_source(mut self, channel: impl Into<String>) -> Self {
        self.sources.push(channel.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDefinition {
    pub name: String,
}

impl ChannelDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A shared resource (data source, cache, ...) built before components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    pub kind: String,
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl ResourceDefinition {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            settings: BTreeMap::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }
}

/// Explicit wire from `component/reference` to `component[/service]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDefinition {
    pub source: String,
    pub target: String,
}

impl WireDefinition {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}
