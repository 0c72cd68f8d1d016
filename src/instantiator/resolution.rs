//! Target resolution and autowire for newly instantiated components.

use super::{InstantiationContext, InstantiationError, PendingWire};
use crate::definition::{Multiplicity, QName};
use crate::model::{child_uri, LogicalCompositeComponent, LogicalState, LogicalWire};
use std::collections::{HashMap, HashSet};
use tracing::debug;

enum Resolution {
    Reference {
        component: String,
        parent: String,
        name: String,
        uri: String,
        targets: Vec<String>,
    },
    Producer {
        component: String,
        name: String,
        targets: Vec<String>,
    },
    Consumer {
        component: String,
        name: String,
        sources: Vec<String>,
    },
}

/// Resolve targets of every component recorded in `context`, then write the
/// results back into the model
pub(super) fn resolve(
    root: &mut LogicalCompositeComponent,
    pending_wires: &[PendingWire],
    deployable: &QName,
    context: &mut InstantiationContext,
) {
    let resolutions = collect(root, pending_wires, context);
    apply(root, resolutions, deployable, context);
}

fn collect(
    root: &LogicalCompositeComponent,
    pending_wires: &[PendingWire],
    context: &mut InstantiationContext,
) -> Vec<Resolution> {
    let mut resolutions = Vec::new();
    let mut wired: HashMap<String, Vec<String>> = HashMap::new();
    let mut bound: HashSet<String> = HashSet::new();

    for pending in pending_wires {
        match resolve_wire(root, pending) {
            Ok((reference, target)) => {
                bound.insert(reference.clone());
                wired.entry(reference).or_default().push(target);
            }
            Err((reference, error)) => {
                if let Some(reference) = reference {
                    bound.insert(reference);
                }
                context.add_error(error);
            }
        }
    }

    let added: Vec<String> = context.added_components().to_vec();
    for component_uri in added {
        let Some(node) = root.get_component(&component_uri) else {
            continue;
        };
        let component = node.component();
        let definition = component.definition().clone();
        let parent = component.parent().unwrap_or(root.uri()).to_string();
        let levels = ancestor_levels(root, &parent);

        for reference in &component.references {
            let Some(declared) = definition.references.iter().find(|r| r.name == reference.name)
            else {
                continue;
            };

            let mut targets = Vec::new();
            if !declared.targets.is_empty() {
                for target in &declared.targets {
                    match resolve_service_target(root, &levels, &reference.uri, target) {
                        Ok(uri) => targets.push(uri),
                        Err(e) => context.add_error(e),
                    }
                }
            } else if let Some(explicit) = wired.remove(&reference.uri) {
                targets = explicit;
            } else if bound.contains(&reference.uri) {
                continue;
            } else if reference.autowire {
                match autowire_service(
                    root,
                    &levels,
                    &component_uri,
                    &reference.uri,
                    &reference.contract,
                    reference.multiplicity,
                ) {
                    Ok(candidates) => {
                        if candidates.is_empty() {
                            debug!(reference = %reference.uri, "No autowire candidates");
                        }
                        targets = candidates;
                    }
                    Err(e) => {
                        context.add_error(e);
                        continue;
                    }
                }
                if targets.is_empty() && reference.multiplicity.is_required() {
                    context.add_error(InstantiationError::UnsatisfiedReference {
                        reference: reference.uri.clone(),
                    });
                }
            } else if reference.multiplicity.is_required() {
                context.add_error(InstantiationError::UnsatisfiedReference {
                    reference: reference.uri.clone(),
                });
            }

            if !targets.is_empty() {
                resolutions.push(Resolution::Reference {
                    component: component_uri.clone(),
                    parent: parent.clone(),
                    name: reference.name.clone(),
                    uri: reference.uri.clone(),
                    targets,
                });
            }
        }

        for producer in &component.producers {
            let declared = definition
                .producers
                .iter()
                .find(|p| p.name == producer.name)
                .map(|p| p.targets.clone())
                .unwrap_or_default();
            let mut targets = Vec::new();
            if declared.is_empty() {
                match autowire_channel(root, &levels, &producer.uri, &producer.name) {
                    Ok(Some(channel)) => targets.push(channel),
                    Ok(None) => {}
                    Err(e) => context.add_error(e),
                }
            } else {
                for channel in &declared {
                    match resolve_channel(root, &levels, &producer.uri, channel) {
                        Ok(uri) => targets.push(uri),
                        Err(e) => context.add_error(e),
                    }
                }
            }
            if !targets.is_empty() {
                resolutions.push(Resolution::Producer {
                    component: component_uri.clone(),
                    name: producer.name.clone(),
                    targets,
                });
            }
        }

        for consumer in &component.consumers {
            let declared = definition
                .consumers
                .iter()
                .find(|c| c.name == consumer.name)
                .map(|c| c.sources.clone())
                .unwrap_or_default();
            let mut sources = Vec::new();
            for channel in &declared {
                match resolve_channel(root, &levels, &consumer.uri, channel) {
                    Ok(uri) => sources.push(uri),
                    Err(e) => context.add_error(e),
                }
            }
            if !sources.is_empty() {
                resolutions.push(Resolution::Consumer {
                    component: component_uri.clone(),
                    name: consumer.name.clone(),
                    sources,
                });
            }
        }
    }

    resolutions
}

fn apply(
    root: &mut LogicalCompositeComponent,
    resolutions: Vec<Resolution>,
    deployable: &QName,
    context: &mut InstantiationContext,
) {
    for resolution in resolutions {
        match resolution {
            Resolution::Reference {
                component,
                parent,
                name,
                uri,
                targets,
            } => {
                if let Some(reference) = root
                    .get_component_mut(&component)
                    .and_then(|node| node.component_mut().reference_mut(&name))
                {
                    for target in &targets {
                        reference.add_target(target.clone());
                    }
                }
                if let Some(composite) = root.find_composite_mut(&parent) {
                    for target in targets {
                        composite.add_wire(LogicalWire {
                            source: uri.clone(),
                            target,
                            deployable: Some(deployable.clone()),
                            state: LogicalState::New,
                        });
                        context.record_wire();
                    }
                }
            }
            Resolution::Producer {
                component,
                name,
                targets,
            } => {
                if let Some(node) = root.get_component_mut(&component) {
                    if let Some(producer) = node
                        .component_mut()
                        .producers
                        .iter_mut()
                        .find(|p| p.name == name)
                    {
                        producer.targets = targets;
                    }
                }
            }
            Resolution::Consumer {
                component,
                name,
                sources,
            } => {
                if let Some(node) = root.get_component_mut(&component) {
                    if let Some(consumer) = node
                        .component_mut()
                        .consumers
                        .iter_mut()
                        .find(|c| c.name == name)
                    {
                        consumer.sources = sources;
                    }
                }
            }
        }
    }
}

/// Composite URIs from `start` up to the root, nearest first
fn ancestor_levels(root: &LogicalCompositeComponent, start: &str) -> Vec<String> {
    let mut levels = Vec::new();
    let mut current = Some(start.to_string());
    while let Some(uri) = current {
        let Some(composite) = root.find_composite(&uri) else {
            break;
        };
        current = if uri == root.uri() {
            None
        } else {
            composite.component().parent().map(str::to_string)
        };
        levels.push(uri);
    }
    levels
}

fn resolve_wire(
    root: &LogicalCompositeComponent,
    pending: &PendingWire,
) -> Result<(String, String), (Option<String>, InstantiationError)> {
    let invalid = |reason: &str| InstantiationError::InvalidWire {
        composite: pending.composite.clone(),
        source_name: pending.definition.source.clone(),
        reason: reason.to_string(),
    };

    let Some((component_name, reference_name)) = pending.definition.source.split_once('/')
    else {
        return Err((None, invalid("source must name component/reference")));
    };
    let component_uri = child_uri(&pending.composite, component_name);
    let Some(node) = root.get_component(&component_uri) else {
        return Err((None, invalid("source component not found")));
    };
    let Some(reference) = node.component().reference(reference_name) else {
        return Err((
            None,
            InstantiationError::ReferenceNotFound {
                component: component_uri,
                reference: reference_name.to_string(),
            },
        ));
    };

    let levels = ancestor_levels(root, &pending.composite);
    resolve_service_target(root, &levels, &reference.uri, &pending.definition.target)
        .map(|target| (reference.uri.clone(), target))
        .map_err(|e| (Some(reference.uri.clone()), e))
}

/// Resolve `component` or `component/service` against the given levels
fn resolve_service_target(
    root: &LogicalCompositeComponent,
    levels: &[String],
    reference: &str,
    target: &str,
) -> Result<String, InstantiationError> {
    let (component_name, service_name) = match target.split_once('/') {
        Some((component, service)) => (component, Some(service)),
        None => (target, None),
    };

    for level in levels {
        let Some(composite) = root.find_composite(level) else {
            continue;
        };
        let uri = child_uri(level, component_name);
        let Some(node) = composite
            .components()
            .iter()
            .find(|n| n.uri() == uri && n.component().state != LogicalState::MarkedForDeletion)
        else {
            continue;
        };

        let services = &node.component().services;
        return match service_name {
            Some(name) => services
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.uri.clone())
                .ok_or_else(|| InstantiationError::ServiceNotFound {
                    reference: reference.to_string(),
                    target: target.to_string(),
                }),
            None => match services.as_slice() {
                [only] => Ok(only.uri.clone()),
                [] => Err(InstantiationError::ServiceNotFound {
                    reference: reference.to_string(),
                    target: target.to_string(),
                }),
                _ => Err(InstantiationError::AmbiguousService {
                    reference: reference.to_string(),
                    target: target.to_string(),
                }),
            },
        };
    }

    Err(InstantiationError::ReferenceTargetNotFound {
        reference: reference.to_string(),
        target: target.to_string(),
    })
}

/// Services matching `contract` at the nearest level that has any
fn autowire_service(
    root: &LogicalCompositeComponent,
    levels: &[String],
    component: &str,
    reference: &str,
    contract: &str,
    multiplicity: Multiplicity,
) -> Result<Vec<String>, InstantiationError> {
    for level in levels {
        let Some(composite) = root.find_composite(level) else {
            continue;
        };
        let candidates: Vec<String> = composite
            .components()
            .iter()
            .filter(|n| n.uri() != component)
            .filter(|n| n.component().state != LogicalState::MarkedForDeletion)
            .flat_map(|n| n.component().services.iter())
            .filter(|s| s.contract == contract)
            .map(|s| s.uri.clone())
            .collect();

        if candidates.is_empty() {
            continue;
        }
        if multiplicity.is_single() && candidates.len() > 1 {
            return Err(InstantiationError::AmbiguousAutowire {
                source_uri: reference.to_string(),
                candidates,
            });
        }
        return Ok(candidates);
    }
    Ok(Vec::new())
}

fn resolve_channel(
    root: &LogicalCompositeComponent,
    levels: &[String],
    source: &str,
    name: &str,
) -> Result<String, InstantiationError> {
    for level in levels {
        let Some(composite) = root.find_composite(level) else {
            continue;
        };
        let uri = child_uri(level, name);
        if composite
            .channels()
            .iter()
            .any(|c| c.uri == uri && c.state != LogicalState::MarkedForDeletion)
        {
            return Ok(uri);
        }
    }
    Err(InstantiationError::ChannelNotFound {
        source_uri: source.to_string(),
        channel: name.to_string(),
    })
}

/// Channel named like the producer, else the only channel, at the nearest level
/// that has channels
fn autowire_channel(
    root: &LogicalCompositeComponent,
    levels: &[String],
    source: &str,
    name: &str,
) -> Result<Option<String>, InstantiationError> {
    for level in levels {
        let Some(composite) = root.find_composite(level) else {
            continue;
        };
        let live: Vec<&str> = composite
            .channels()
            .iter()
            .filter(|c| c.state != LogicalState::MarkedForDeletion)
            .map(|c| c.uri.as_str())
            .collect();

        let named = child_uri(level, name);
        if live.contains(&named.as_str()) {
            return Ok(Some(named));
        }
        match live.as_slice() {
            [] => continue,
            [only] => return Ok(Some((*only).to_string())),
            _ => {
                return Err(InstantiationError::AmbiguousAutowire {
                    source_uri: source.to_string(),
                    candidates: live.iter().map(|c| (*c).to_string()).collect(),
                })
            }
        }
    }
    Ok(None)
}
