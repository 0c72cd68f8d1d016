//! Pluggable translation of logical components and resources into physical
//! definitions, selected by implementation or resource kind.

use super::GenerationError;
use crate::command::{PhysicalComponent, PhysicalReference, PhysicalResource};
use crate::definition::QName;
use crate::model::{LogicalComponent, LogicalResource};
use std::collections::BTreeMap;

pub trait ComponentGenerator: Send + Sync {
    fn generate(&self, component: &LogicalComponent) -> Result<PhysicalComponent, GenerationError>;
}

pub trait ResourceGenerator: Send + Sync {
    fn generate(&self, resource: &LogicalResource) -> Result<PhysicalResource, GenerationError>;
}

/// Generator for atomic implementations whose builders only need the
/// declared properties and resolved reference targets
#[derive(Debug, Clone, Default)]
pub struct ImplementationGenerator;

impl ComponentGenerator for ImplementationGenerator {
    fn generate(&self, component: &LogicalComponent) -> Result<PhysicalComponent, GenerationError> {
        let definition = component.definition();
        let references = component
            .references
            .iter()
            .map(|r| PhysicalReference {
                name: r.name.clone(),
                contract: r.contract.clone(),
                targets: r.targets.clone(),
            })
            .collect();

        Ok(PhysicalComponent {
            uri: component.uri().to_string(),
            contribution: component.contribution().to_string(),
            deployable: deployable_of(component.uri(), component.deployable.as_ref())?,
            implementation: definition.implementation_kind().to_string(),
            eager_init: definition.eager_init,
            references,
            properties: stringify(&definition.properties),
        })
    }
}

/// Generator for resources configured entirely through settings
#[derive(Debug, Clone, Default)]
pub struct SettingsResourceGenerator;

impl ResourceGenerator for SettingsResourceGenerator {
    fn generate(&self, resource: &LogicalResource) -> Result<PhysicalResource, GenerationError> {
        Ok(PhysicalResource {
            uri: resource.uri.clone(),
            kind: resource.definition.kind.clone(),
            deployable: deployable_of(&resource.uri, resource.deployable.as_ref())?,
            settings: stringify(&resource.definition.settings),
        })
    }
}

pub(crate) fn deployable_of(uri: &str, deployable: Option<&QName>) -> Result<QName, GenerationError> {
    deployable
        .cloned()
        .ok_or_else(|| GenerationError::MissingDeployable {
            uri: uri.to_string(),
        })
}

fn stringify(values: &BTreeMap<String, serde_json::Value>) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect()
}
