use crate::config::ConfigurationError;
use crate::definition::QName;
use crate::deployer::DeploymentError;
use crate::domain::{AllocationError, ContributionError, JournalError};
use crate::executor::ExecutionError;
use crate::generator::GenerationError;
use crate::instantiator::AssemblyFailure;
use crate::runtime::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FabricError {
    #[error(transparent)]
    Assembly(#[from] AssemblyFailure),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Deployment(#[from] DeploymentError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("Contribution error: {0}")]
    Contribution(#[from] ContributionError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Deployable {0} is already deployed")]
    AlreadyDeployed(QName),

    #[error("Deployable {0} is not deployed")]
    NotDeployed(QName),
}

pub type Result<T> = std::result::Result<T, FabricError>;
