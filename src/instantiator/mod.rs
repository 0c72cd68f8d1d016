//! # Logical Model Instantiator
//!
//! Expands a parsed [`Composite`] into logical model nodes attached under a
//! target composite.
//!
//! ## Passes
//!
//! 1. **Create**: one logical node per declared component (nested logical
//!    composites for composite implementations), channel and resource, plus
//!    the services, references, producers and consumers of each component.
//!    Included composites are merged into the including one.
//! 2. **Resolve**: reference, producer and consumer targets and explicit wires
//!    are resolved to URIs, and unbound references are autowired. Resolution
//!    runs after creation so that a target may be declared later in the same
//!    composite.
//!
//! Every problem is recorded in the returned [`InstantiationContext`]; nothing
//! is thrown mid-pass. New nodes are tagged with the composite's name as their
//! deployable unit and start in [`LogicalState::New`].

mod context;
mod resolution;

pub use context::{AssemblyFailure, InstantiationContext, InstantiationError};

use crate::definition::{Composite, Implementation, QName, WireDefinition};
use crate::model::{
    child_uri, LogicalChannel, LogicalComponent, LogicalCompositeComponent, LogicalConsumer,
    LogicalNode, LogicalProducer, LogicalReference, LogicalResource, LogicalService, LogicalState,
};
use crate::constants::UNASSIGNED_ZONE;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Wire definitions waiting for the resolve pass, keyed by the logical URI of
/// the composite that declared them
pub(crate) struct PendingWire {
    pub composite: String,
    pub definition: WireDefinition,
}

/// Creates logical model nodes from composite definitions
#[derive(Debug, Clone, Default)]
pub struct LogicalModelInstantiator;

impl LogicalModelInstantiator {
    pub fn new() -> Self {
        Self
    }

    /// Instantiate `composite` under `target`
    ///
    /// Autowire searches `target` and the composites nested in it; `target`
    /// is normally the domain root.
    #[instrument(skip_all, fields(composite = %composite.name, target = %target.uri()))]
    pub fn include(
        &self,
        composite: &Composite,
        target: &mut LogicalCompositeComponent,
    ) -> InstantiationContext {
        let mut context = InstantiationContext::new();
        let mut pending_wires = Vec::new();
        let deployable = composite.name.clone();

        self.create_contents(
            composite,
            target,
            &deployable,
            &mut pending_wires,
            &mut context,
        );
        resolution::resolve(target, &pending_wires, &deployable, &mut context);

        info!(
            deployable = %deployable,
            components = context.added_components().len(),
            channels = context.added_channels().len(),
            resources = context.added_resources().len(),
            wires = context.added_wires(),
            errors = context.errors().len(),
            "Instantiated composite"
        );
        context
    }

    fn create_contents(
        &self,
        composite: &Composite,
        parent: &mut LogicalCompositeComponent,
        deployable: &QName,
        pending_wires: &mut Vec<PendingWire>,
        context: &mut InstantiationContext,
    ) {
        let parent_uri = parent.uri().to_string();

        for definition in composite.all_channels() {
            let uri = child_uri(&parent_uri, &definition.name);
            if parent.channels().iter().any(|c| c.uri == uri) {
                context.add_error(InstantiationError::DuplicateChannel { uri });
                continue;
            }
            let channel = LogicalChannel {
                uri: uri.clone(),
                name: definition.name.clone(),
                parent: parent_uri.clone(),
                deployable: Some(deployable.clone()),
                contribution: composite.contribution.clone(),
                zone: UNASSIGNED_ZONE.to_string(),
                state: LogicalState::New,
            };
            match parent.add_channel(channel) {
                Ok(()) => context.record_channel(uri),
                Err(e) => context.add_error(e.into()),
            }
        }

        for definition in composite.all_resources() {
            let uri = child_uri(&parent_uri, &definition.name);
            if parent.resources().iter().any(|r| r.uri == uri) {
                context.add_error(InstantiationError::DuplicateResource { uri });
                continue;
            }
            let resource = LogicalResource {
                uri: uri.clone(),
                definition: definition.clone(),
                parent: parent_uri.clone(),
                deployable: Some(deployable.clone()),
                contribution: composite.contribution.clone(),
                zone: UNASSIGNED_ZONE.to_string(),
                state: LogicalState::New,
            };
            match parent.add_resource(resource) {
                Ok(()) => context.record_resource(uri),
                Err(e) => context.add_error(e.into()),
            }
        }

        for definition in composite.all_components() {
            let uri = child_uri(&parent_uri, &definition.name);
            if parent.get_component(&uri).is_some() {
                context.add_error(InstantiationError::DuplicateComponent { uri });
                continue;
            }

            let mut component = LogicalComponent::new(
                &parent_uri,
                Arc::new(definition.clone()),
                composite.contribution.clone(),
                Some(deployable.clone()),
            );
            for service in &definition.services {
                component
                    .services
                    .push(LogicalService::new(&uri, &service.name, &service.contract));
            }
            for reference in &definition.references {
                let mut logical = LogicalReference::new(
                    &uri,
                    &reference.name,
                    &reference.contract,
                    reference.multiplicity,
                );
                logical.autowire = reference.autowire.unwrap_or(composite.autowire);
                component.references.push(logical);
            }
            for producer in &definition.producers {
                component
                    .producers
                    .push(LogicalProducer::new(&uri, &producer.name));
            }
            for consumer in &definition.consumers {
                component
                    .consumers
                    .push(LogicalConsumer::new(&uri, &consumer.name));
            }

            let node = match &definition.implementation {
                Implementation::Atomic { .. } => LogicalNode::Atomic(component),
                Implementation::Composite(inner) => {
                    let mut nested = LogicalCompositeComponent::new(component, inner.autowire);
                    debug!(uri = %uri, composite = %inner.name, "Instantiating nested composite");
                    self.create_contents(inner, &mut nested, deployable, pending_wires, context);
                    LogicalNode::Composite(nested)
                }
            };

            match parent.add_component(node) {
                Ok(()) => context.record_component(uri),
                Err(e) => context.add_error(e.into()),
            }
        }

        for wire in composite.all_wires() {
            pending_wires.push(PendingWire {
                composite: parent_uri.clone(),
                definition: wire.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{
        ChannelDefinition, ComponentDefinition, ConsumerDefinition, Multiplicity,
        ProducerDefinition, ReferenceDefinition, ResourceDefinition,
    };

    const DOMAIN: &str = "fabric3://domain";

    fn qname(local: &str) -> QName {
        QName::new("urn:test", local)
    }

    fn include(composite: Composite) -> (LogicalCompositeComponent, InstantiationContext) {
        let mut root = LogicalCompositeComponent::domain(DOMAIN);
        let context = LogicalModelInstantiator::new().include(&composite, &mut root);
        (root, context)
    }

    #[test]
    fn test_include_creates_component_tagged_with_deployable() {
        let composite = Composite::new(qname("bar"), "test")
            .with_component(ComponentDefinition::atomic("component", "rust"));
        let (root, context) = include(composite);

        assert!(!context.has_errors());
        let node = root.get_component("fabric3://domain/component").unwrap();
        assert_eq!(node.component().deployable, Some(qname("bar")));
        assert_eq!(node.component().state, LogicalState::New);
        assert_eq!(node.component().zone, UNASSIGNED_ZONE);
        assert_eq!(node.component().contribution(), "test");
    }

    #[test]
    fn test_explicit_target_resolves_declared_later() {
        let composite = Composite::new(qname("bar"), "test")
            .with_component(
                ComponentDefinition::atomic("client", "rust")
                    .with_reference(ReferenceDefinition::new("svc", "Calc").with_target("calc")),
            )
            .with_component(ComponentDefinition::atomic("calc", "rust").with_service("Calc", "Calc"));
        let (root, context) = include(composite);

        assert!(!context.has_errors(), "{:?}", context.errors());
        let client = root.get_component("fabric3://domain/client").unwrap();
        assert_eq!(
            client.component().reference("svc").unwrap().targets,
            vec!["fabric3://domain/calc#Calc".to_string()]
        );
        assert_eq!(root.wires().len(), 1);
        assert_eq!(context.added_wires(), 1);
    }

    #[test]
    fn test_autowire_single_match() {
        let composite = Composite::new(qname("bar"), "test")
            .with_component(
                ComponentDefinition::atomic("client", "rust")
                    .with_reference(ReferenceDefinition::new("svc", "Calc")),
            )
            .with_component(ComponentDefinition::atomic("calc", "rust").with_service("Calc", "Calc"));
        let (root, context) = include(composite);

        assert!(!context.has_errors(), "{:?}", context.errors());
        let client = root.get_component("fabric3://domain/client").unwrap();
        assert!(client.component().reference("svc").unwrap().is_resolved());
    }

    #[test]
    fn test_ambiguous_autowire_is_accumulated_with_other_errors() {
        let composite = Composite::new(qname("bar"), "test")
            .with_component(
                ComponentDefinition::atomic("client", "rust")
                    .with_reference(ReferenceDefinition::new("svc", "Calc")),
            )
            .with_component(ComponentDefinition::atomic("calc1", "rust").with_service("Calc", "Calc"))
            .with_component(ComponentDefinition::atomic("calc2", "rust").with_service("Calc", "Calc"))
            .with_component(
                ComponentDefinition::atomic("other", "rust")
                    .with_reference(ReferenceDefinition::new("x", "X").with_target("missing")),
            );
        let (_, context) = include(composite);

        let ambiguous = context
            .errors()
            .iter()
            .filter(|e| matches!(e, InstantiationError::AmbiguousAutowire { .. }))
            .count();
        assert_eq!(ambiguous, 1);
        assert!(context
            .errors()
            .iter()
            .any(|e| matches!(e, InstantiationError::ReferenceTargetNotFound { .. })));
    }

    #[test]
    fn test_optional_reference_without_match_is_not_an_error() {
        let composite = Composite::new(qname("bar"), "test").with_component(
            ComponentDefinition::atomic("client", "rust").with_reference(
                ReferenceDefinition::new("svc", "Calc").with_multiplicity(Multiplicity::ZeroOne),
            ),
        );
        let (_, context) = include(composite);
        assert!(!context.has_errors());
    }

    #[test]
    fn test_required_reference_without_match_is_reported() {
        let composite = Composite::new(qname("bar"), "test").with_component(
            ComponentDefinition::atomic("client", "rust")
                .with_reference(ReferenceDefinition::new("svc", "Calc")),
        );
        let (_, context) = include(composite);
        assert!(matches!(
            context.errors(),
            [InstantiationError::UnsatisfiedReference { .. }]
        ));
    }

    #[test]
    fn test_multi_valued_reference_wires_every_match() {
        let composite = Composite::new(qname("bar"), "test")
            .with_component(ComponentDefinition::atomic("client", "rust").with_reference(
                ReferenceDefinition::new("svc", "Calc").with_multiplicity(Multiplicity::ZeroN),
            ))
            .with_component(ComponentDefinition::atomic("calc1", "rust").with_service("Calc", "Calc"))
            .with_component(ComponentDefinition::atomic("calc2", "rust").with_service("Calc", "Calc"));
        let (root, context) = include(composite);

        assert!(!context.has_errors());
        let client = root.get_component("fabric3://domain/client").unwrap();
        assert_eq!(client.component().reference("svc").unwrap().targets.len(), 2);
    }

    #[test]
    fn test_nested_composite_autowires_from_ancestor() {
        let inner = Composite::new(qname("inner"), "test").with_component(
            ComponentDefinition::atomic("client", "rust")
                .with_reference(ReferenceDefinition::new("svc", "Calc")),
        );
        let composite = Composite::new(qname("bar"), "test")
            .with_component(ComponentDefinition::composite("nested", Arc::new(inner)))
            .with_component(ComponentDefinition::atomic("calc", "rust").with_service("Calc", "Calc"));
        let (root, context) = include(composite);

        assert!(!context.has_errors(), "{:?}", context.errors());
        let client = root
            .get_component("fabric3://domain/nested/client")
            .unwrap();
        assert_eq!(
            client.component().reference("svc").unwrap().targets,
            vec!["fabric3://domain/calc#Calc".to_string()]
        );
        assert_eq!(context.added_components().len(), 3);
    }

    #[test]
    fn test_channels_resources_and_connections() {
        let composite = Composite::new(qname("bar"), "test")
            .with_channel(ChannelDefinition::new("events"))
            .with_resource(ResourceDefinition::new("db", "datasource"))
            .with_component(
                ComponentDefinition::atomic("publisher", "rust")
                    .with_producer(ProducerDefinition::new("events")),
            )
            .with_component(
                ComponentDefinition::atomic("listener", "rust")
                    .with_consumer(ConsumerDefinition::new("in").with_source("events")),
            );
        let (root, context) = include(composite);

        assert!(!context.has_errors(), "{:?}", context.errors());
        assert_eq!(root.channels().len(), 1);
        assert_eq!(root.resources().len(), 1);
        let publisher = root.get_component("fabric3://domain/publisher").unwrap();
        assert_eq!(
            publisher.component().producers[0].targets,
            vec!["fabric3://domain/events".to_string()]
        );
        let listener = root.get_component("fabric3://domain/listener").unwrap();
        assert_eq!(
            listener.component().consumers[0].sources,
            vec!["fabric3://domain/events".to_string()]
        );
    }

    #[test]
    fn test_missing_channel_is_reported() {
        let composite = Composite::new(qname("bar"), "test").with_component(
            ComponentDefinition::atomic("listener", "rust")
                .with_consumer(ConsumerDefinition::new("in").with_source("nowhere")),
        );
        let (_, context) = include(composite);
        assert!(matches!(
            context.errors(),
            [InstantiationError::ChannelNotFound { .. }]
        ));
    }

    #[test]
    fn test_duplicate_include_reports_duplicates_but_keeps_first() {
        let composite = Composite::new(qname("bar"), "test")
            .with_component(ComponentDefinition::atomic("component", "rust"));
        let mut root = LogicalCompositeComponent::domain(DOMAIN);
        let instantiator = LogicalModelInstantiator::new();

        assert!(!instantiator.include(&composite, &mut root).has_errors());
        let second = instantiator.include(&composite, &mut root);
        assert!(matches!(
            second.errors(),
            [InstantiationError::DuplicateComponent { .. }]
        ));
        assert_eq!(root.components().len(), 1);
    }

    #[test]
    fn test_explicit_wire_definition() {
        let composite = Composite::new(qname("bar"), "test")
            .with_autowire(false)
            .with_component(
                ComponentDefinition::atomic("client", "rust")
                    .with_reference(ReferenceDefinition::new("svc", "Calc")),
            )
            .with_component(ComponentDefinition::atomic("calc", "rust").with_service("Calc", "Calc"))
            .with_wire(WireDefinition::new("client/svc", "calc/Calc"));
        let (root, context) = include(composite);

        assert!(!context.has_errors(), "{:?}", context.errors());
        let client = root.get_component("fabric3://domain/client").unwrap();
        assert!(client.component().reference("svc").unwrap().is_resolved());
    }

    #[test]
    fn test_invalid_wire_source() {
        let composite = Composite::new(qname("bar"), "test")
            .with_component(ComponentDefinition::atomic("calc", "rust").with_service("Calc", "Calc"))
            .with_wire(WireDefinition::new("ghost/svc", "calc"));
        let (_, context) = include(composite);
        assert!(matches!(
            context.errors(),
            [InstantiationError::InvalidWire { .. }]
        ));
    }

    #[test]
    fn test_wire_from_undeclared_reference() {
        let composite = Composite::new(qname("bar"), "test")
            .with_component(ComponentDefinition::atomic("client", "rust"))
            .with_component(ComponentDefinition::atomic("calc", "rust").with_service("Calc", "Calc"))
            .with_wire(WireDefinition::new("client/missing", "calc"));
        let (_, context) = include(composite);
        assert!(matches!(
            context.errors(),
            [InstantiationError::ReferenceNotFound { reference, .. }] if reference == "missing"
        ));
    }
}
