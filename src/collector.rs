//! # Collector
//!
//! Manages the provisioning state of logical nodes across deploy and undeploy,
//! and prunes the subtree a deployable unit contributed once it is gone.
//!
//! ## Lifecycle
//!
//! ```text
//! include:   New --(deploy ok)--> Provisioned           mark_as_provisioned
//!            New --(failure)----> removed               prune
//! undeploy:  Provisioned --> MarkedForDeletion          mark_for_deletion
//!            MarkedForDeletion --(deploy ok)--> removed collect
//!            MarkedForDeletion --(failure)--> Provisioned unmark
//! ```

use crate::definition::QName;
use crate::model::{LogicalCompositeComponent, LogicalNode, LogicalState};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Collector;

impl Collector {
    pub fn new() -> Self {
        Self
    }

    /// Mark every node contributed by `deployable` for deletion
    pub fn mark_for_deletion(&self, deployable: &QName, root: &mut LogicalCompositeComponent) {
        let deployables = std::slice::from_ref(deployable);
        Self::set_state(root, deployables, None, LogicalState::MarkedForDeletion);
    }

    /// Restore nodes of `deployable` that were marked for deletion
    pub fn unmark(&self, deployable: &QName, root: &mut LogicalCompositeComponent) {
        let deployables = std::slice::from_ref(deployable);
        Self::set_state(
            root,
            deployables,
            Some(LogicalState::MarkedForDeletion),
            LogicalState::Provisioned,
        );
    }

    /// Transition new nodes of the given deployables to provisioned
    pub fn mark_as_provisioned(&self, deployables: &[QName], root: &mut LogicalCompositeComponent) {
        Self::set_state(
            root,
            deployables,
            Some(LogicalState::New),
            LogicalState::Provisioned,
        );
    }

    /// Remove the nodes of `deployables` that are marked for deletion
    ///
    /// Marked nodes of other deployables stay in place; their own operation
    /// may still restore them. Reference targets and wires that pointed at
    /// removed services are dropped as well so that surviving references
    /// never dangle.
    pub fn collect(&self, deployables: &[QName], root: &mut LogicalCompositeComponent) -> usize {
        let doomed = |deployable: &Option<QName>, state: LogicalState| {
            state == LogicalState::MarkedForDeletion
                && deployable.as_ref().is_some_and(|d| deployables.contains(d))
        };
        let mut removed_services = HashSet::new();
        let mut removed_channels = HashSet::new();
        let mut removed = 0;

        root.for_each_composite_mut(&mut |composite| {
            composite.components_mut().retain(|node| {
                let component = node.component();
                if doomed(&component.deployable, component.state) {
                    collect_bindables(node, &mut removed_services, &mut removed_channels);
                    removed += 1;
                    false
                } else {
                    true
                }
            });
            composite.channels_mut().retain(|channel| {
                if doomed(&channel.deployable, channel.state) {
                    removed_channels.insert(channel.uri.clone());
                    removed += 1;
                    false
                } else {
                    true
                }
            });
            composite.resources_mut().retain(|resource| {
                let keep = !doomed(&resource.deployable, resource.state);
                if !keep {
                    removed += 1;
                }
                keep
            });
            composite
                .wires_mut()
                .retain(|wire| !doomed(&wire.deployable, wire.state));
        });

        if !removed_services.is_empty() || !removed_channels.is_empty() {
            root.for_each_composite_mut(&mut |composite| {
                composite
                    .wires_mut()
                    .retain(|wire| !removed_services.contains(&wire.target));
            });
            root.for_each_component_mut(&mut |component| {
                for reference in &mut component.references {
                    reference.targets.retain(|t| !removed_services.contains(t));
                }
                for producer in &mut component.producers {
                    producer.targets.retain(|t| !removed_channels.contains(t));
                }
                for consumer in &mut component.consumers {
                    consumer.sources.retain(|s| !removed_channels.contains(s));
                }
            });
        }

        debug!(removed = removed, "Collected logical nodes marked for deletion");
        removed
    }

    /// Discard everything the given deployables contributed, whatever its state
    pub fn prune(&self, deployables: &[QName], root: &mut LogicalCompositeComponent) -> usize {
        Self::set_state(root, deployables, None, LogicalState::MarkedForDeletion);
        self.collect(deployables, root)
    }

    fn set_state(
        root: &mut LogicalCompositeComponent,
        deployables: &[QName],
        from: Option<LogicalState>,
        to: LogicalState,
    ) {
        let matches = |deployable: &Option<QName>, state: LogicalState| {
            deployable.as_ref().is_some_and(|d| deployables.contains(d))
                && from.map_or(true, |f| f == state)
        };

        root.for_each_component_mut(&mut |component| {
            if matches(&component.deployable, component.state) {
                component.state = to;
            }
        });
        root.for_each_composite_mut(&mut |composite| {
            for channel in composite.channels_mut() {
                if matches(&channel.deployable, channel.state) {
                    channel.state = to;
                }
            }
            for resource in composite.resources_mut() {
                if matches(&resource.deployable, resource.state) {
                    resource.state = to;
                }
            }
            for wire in composite.wires_mut() {
                if matches(&wire.deployable, wire.state) {
                    wire.state = to;
                }
            }
        });
    }
}

/// Record the service and channel URIs that disappear with `node`
fn collect_bindables(
    node: &LogicalNode,
    services: &mut HashSet<String>,
    channels: &mut HashSet<String>,
) {
    services.extend(node.component().services.iter().map(|s| s.uri.clone()));
    if let LogicalNode::Composite(composite) = node {
        for nested in composite.composites() {
            channels.extend(nested.channels().iter().map(|c| c.uri.clone()));
        }
        for child in composite.descendants() {
            services.extend(child.component().services.iter().map(|s| s.uri.clone()));
        }
    }
}
