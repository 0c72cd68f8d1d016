use crate::definition::QName;

/// Callbacks around domain operations
///
/// All methods default to no-ops. Callbacks run on the caller's task and
/// must not block.
pub trait DeployListener: Send + Sync {
    fn on_deploy(&self, _deployable: &QName) {}

    fn on_deploy_completed(&self, _deployable: &QName) {}

    fn on_undeploy(&self, _deployable: &QName) {}

    fn on_undeploy_completed(&self, _deployable: &QName) {}
}
