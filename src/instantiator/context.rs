use crate::definition::QName;
use crate::model::ModelError;
use std::fmt;
use thiserror::Error;

/// Structural problems found while instantiating a composite
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantiationError {
    #[error("Duplicate component: {uri}")]
    DuplicateComponent { uri: String },

    #[error("Duplicate channel: {uri}")]
    DuplicateChannel { uri: String },

    #[error("Duplicate resource: {uri}")]
    DuplicateResource { uri: String },

    #[error("Target {target} of reference {reference} not found")]
    ReferenceTargetNotFound { reference: String, target: String },

    #[error("Service {target} targeted by reference {reference} not found")]
    ServiceNotFound { reference: String, target: String },

    #[error("Target {target} of reference {reference} offers more than one service; a service name is required")]
    AmbiguousService { reference: String, target: String },

    #[error("Channel {channel} used by {source_uri} not found")]
    ChannelNotFound { source_uri: String, channel: String },

    #[error("Ambiguous autowire for {source_uri}: candidates {candidates:?}")]
    AmbiguousAutowire {
        source_uri: String,
        candidates: Vec<String>,
    },

    #[error("Required reference {reference} could not be resolved")]
    UnsatisfiedReference { reference: String },

    #[error("Invalid wire in {composite} from {source_name}: {reason}")]
    InvalidWire {
        composite: String,
        source_name: String,
        reason: String,
    },

    #[error("Reference {reference} not found on component {component}")]
    ReferenceNotFound { component: String, reference: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Outcome of one include pass
///
/// Errors are accumulated rather than returned early so that one pass reports
/// every structural problem it finds. The nodes recorded here are attached to
/// the target composite whether or not errors exist; discarding them is the
/// caller's decision.
#[derive(Debug, Clone, Default)]
pub struct InstantiationContext {
    errors: Vec<InstantiationError>,
    components: Vec<String>,
    channels: Vec<String>,
    resources: Vec<String>,
    wires: usize,
}

impl InstantiationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: InstantiationError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[InstantiationError] {
        &self.errors
    }

    /// URIs of the components created by this pass, nested ones included
    pub fn added_components(&self) -> &[String] {
        &self.components
    }

    pub fn added_channels(&self) -> &[String] {
        &self.channels
    }

    pub fn added_resources(&self) -> &[String] {
        &self.resources
    }

    pub fn added_wires(&self) -> usize {
        self.wires
    }

    pub(crate) fn record_component(&mut self, uri: String) {
        self.components.push(uri);
    }

    pub(crate) fn record_channel(&mut self, uri: String) {
        self.channels.push(uri);
    }

    pub(crate) fn record_resource(&mut self, uri: String) {
        self.resources.push(uri);
    }

    pub(crate) fn record_wire(&mut self) {
        self.wires += 1;
    }

    /// Convert accumulated errors into a single failure for `deployable`
    pub fn into_result(self, deployable: &QName) -> Result<Self, AssemblyFailure> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            Err(AssemblyFailure {
                deployable: deployable.clone(),
                errors: self.errors,
            })
        }
    }
}

/// Aggregate of every structural error from one instantiation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyFailure {
    pub deployable: QName,
    pub errors: Vec<InstantiationError>,
}

impl AssemblyFailure {
    pub fn errors(&self) -> &[InstantiationError] {
        &self.errors
    }
}

impl fmt::Display for AssemblyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} assembly error(s) in {}",
            self.errors.len(),
            self.deployable
        )?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AssemblyFailure {}
