use crate::constants::UNASSIGNED_ZONE;
use crate::definition::QName;
use crate::model::{LogicalCompositeComponent, LogicalState};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("Allocation error: {uri} requests unknown zone {zone}")]
    UnknownZone { uri: String, zone: String },
}

/// Assigns zones to newly instantiated nodes before generation
pub trait Allocator: Send + Sync {
    fn allocate(
        &self,
        root: &mut LogicalCompositeComponent,
        deployables: &[QName],
    ) -> Result<(), AllocationError>;
}

/// Places every new node in one zone
///
/// A component's zone hint is honored when it names the default zone or
/// one of the known zones.
#[derive(Debug, Clone)]
pub struct SingleZoneAllocator {
    zone: String,
    known_zones: BTreeSet<String>,
}

impl SingleZoneAllocator {
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            known_zones: BTreeSet::new(),
        }
    }

    pub fn with_known_zone(mut self, zone: impl Into<String>) -> Self {
        self.known_zones.insert(zone.into());
        self
    }

    fn accepts(&self, zone: &str) -> bool {
        zone == self.zone || self.known_zones.contains(zone)
    }
}

impl Allocator for SingleZoneAllocator {
    fn allocate(
        &self,
        root: &mut LogicalCompositeComponent,
        deployables: &[QName],
    ) -> Result<(), AllocationError> {
        let pending = |state: LogicalState, zone: &str| {
            state == LogicalState::New && zone == UNASSIGNED_ZONE
        };

        let mut error = None;
        root.for_each_component_mut(&mut |component| {
            if error.is_some()
                || !component.belongs_to(deployables)
                || !pending(component.state, &component.zone)
            {
                return;
            }
            match component.definition().zone_hint.clone() {
                Some(hint) if !self.accepts(&hint) => {
                    error = Some(AllocationError::UnknownZone {
                        uri: component.uri().to_string(),
                        zone: hint,
                    });
                }
                Some(hint) => component.zone = hint,
                None => component.zone = self.zone.clone(),
            }
        });
        if let Some(error) = error {
            return Err(error);
        }

        let in_scope =
            |deployable: &Option<QName>| deployable.as_ref().is_some_and(|d| deployables.contains(d));
        root.for_each_composite_mut(&mut |composite| {
            for channel in composite.channels_mut() {
                if in_scope(&channel.deployable) && pending(channel.state, &channel.zone) {
                    channel.zone = self.zone.clone();
                }
            }
            for resource in composite.resources_mut() {
                if in_scope(&resource.deployable) && pending(resource.state, &resource.zone) {
                    resource.zone = self.zone.clone();
                }
            }
        });
        Ok(())
    }
}
