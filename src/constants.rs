//! # System Constants
//!
//! Identifiers and defaults shared across the assembly and deployment pipeline.

/// Default URI of the domain root composite
pub const DEFAULT_DOMAIN_URI: &str = "fabric3://domain";

/// Zone assigned to logical nodes until an allocator places them
pub const UNASSIGNED_ZONE: &str = "unassigned";

/// Default name of the zone hosted by the current process
pub const DEFAULT_LOCAL_ZONE: &str = "LocalZone";

/// Separator between a component URI and one of its bindable names
pub const BINDABLE_SEPARATOR: char = '#';

/// Sentinel returned by the extension tracker for ids it does not know about
pub const UNTRACKED: i64 = -1;

/// Environment variable used to select the configuration environment
pub const ENVIRONMENT_VAR: &str = "FABRIC_ENV";

/// Default environment when none is configured
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Pipeline milestones reported through structured logging
pub mod operations {
    pub const INCLUDE: &str = "domain.include";
    pub const UNDEPLOY: &str = "domain.undeploy";
    pub const RECOVER: &str = "domain.recover";
    pub const DEPLOY: &str = "deployer.deploy";
    pub const ROLLBACK: &str = "deployer.rollback";
}
