use crate::definition::{Composite, QName};
use crate::generator::ContributionLookup;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContributionError {
    #[error("Contribution not found: {uri}")]
    NotFound { uri: String },

    #[error("Contribution already installed: {uri}")]
    AlreadyInstalled { uri: String },

    #[error("No installed contribution provides deployable {deployable}")]
    DeployableNotFound { deployable: QName },

    #[error("Deployable {deployable} declares contribution {declared} but is packaged in {uri}")]
    Mismatch {
        uri: String,
        deployable: QName,
        declared: String,
    },

    #[error("Contribution {uri} is locked by {owners:?}")]
    Locked { uri: String, owners: Vec<QName> },
}

/// An installed contribution: deployable composites plus the extension
/// modules its code depends on
#[derive(Debug, Clone)]
pub struct Contribution {
    uri: String,
    deployables: Vec<Arc<Composite>>,
    extends: Vec<String>,
    lock_owners: BTreeSet<QName>,
    installed_at: DateTime<Utc>,
}

impl Contribution {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            deployables: Vec::new(),
            extends: Vec::new(),
            lock_owners: BTreeSet::new(),
            installed_at: Utc::now(),
        }
    }

    pub fn with_deployable(mut self, composite: Composite) -> Self {
        self.deployables.push(Arc::new(composite));
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extends.push(extension.into());
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn deployables(&self) -> &[Arc<Composite>] {
        &self.deployables
    }

    pub fn deployable(&self, name: &QName) -> Option<&Arc<Composite>> {
        self.deployables.iter().find(|d| &d.name == name)
    }

    pub fn extends(&self) -> &[String] {
        &self.extends
    }

    /// Deployables currently deployed from this contribution
    pub fn lock_owners(&self) -> &BTreeSet<QName> {
        &self.lock_owners
    }

    pub fn is_locked(&self) -> bool {
        !self.lock_owners.is_empty()
    }

    pub fn installed_at(&self) -> DateTime<Utc> {
        self.installed_at
    }
}

/// Installed contributions, keyed by URI
#[derive(Debug, Default)]
pub struct ContributionRegistry {
    contributions: DashMap<String, Contribution>,
}

impl ContributionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, contribution: Contribution) -> Result<(), ContributionError> {
        for deployable in &contribution.deployables {
            if deployable.contribution != contribution.uri {
                return Err(ContributionError::Mismatch {
                    uri: contribution.uri.clone(),
                    deployable: deployable.name.clone(),
                    declared: deployable.contribution.clone(),
                });
            }
        }
        let uri = contribution.uri.clone();
        match self.contributions.entry(uri.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(ContributionError::AlreadyInstalled { uri })
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                info!(
                    contribution = %uri,
                    deployables = contribution.deployables.len(),
                    extends = ?contribution.extends,
                    "Installed contribution"
                );
                slot.insert(contribution);
                Ok(())
            }
        }
    }

    /// Remove an unlocked contribution
    pub fn remove(&self, uri: &str) -> Result<Contribution, ContributionError> {
        let owners = self.lock_owners(uri)?;
        if !owners.is_empty() {
            return Err(ContributionError::Locked {
                uri: uri.to_string(),
                owners,
            });
        }
        self.contributions
            .remove(uri)
            .map(|(_, contribution)| contribution)
            .ok_or_else(|| ContributionError::NotFound {
                uri: uri.to_string(),
            })
    }

    pub fn get(&self, uri: &str) -> Option<Contribution> {
        self.contributions.get(uri).map(|c| c.clone())
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.contributions.contains_key(uri)
    }

    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.contributions.iter().map(|c| c.key().clone()).collect();
        uris.sort();
        uris
    }

    /// The contribution providing `name` and the deployable composite itself
    pub fn find_deployable(
        &self,
        name: &QName,
    ) -> Result<(String, Arc<Composite>), ContributionError> {
        self.contributions
            .iter()
            .find_map(|c| c.deployable(name).map(|d| (c.uri.clone(), Arc::clone(d))))
            .ok_or_else(|| ContributionError::DeployableNotFound {
                deployable: name.clone(),
            })
    }

    pub fn acquire_lock(&self, uri: &str, owner: &QName) -> Result<(), ContributionError> {
        let mut contribution =
            self.contributions
                .get_mut(uri)
                .ok_or_else(|| ContributionError::NotFound {
                    uri: uri.to_string(),
                })?;
        contribution.lock_owners.insert(owner.clone());
        debug!(contribution = %uri, owner = %owner, "Acquired contribution lock");
        Ok(())
    }

    pub fn release_lock(&self, uri: &str, owner: &QName) -> Result<(), ContributionError> {
        let mut contribution =
            self.contributions
                .get_mut(uri)
                .ok_or_else(|| ContributionError::NotFound {
                    uri: uri.to_string(),
                })?;
        contribution.lock_owners.remove(owner);
        debug!(contribution = %uri, owner = %owner, "Released contribution lock");
        Ok(())
    }

    pub fn lock_owners(&self, uri: &str) -> Result<Vec<QName>, ContributionError> {
        self.contributions
            .get(uri)
            .map(|c| c.lock_owners.iter().cloned().collect())
            .ok_or_else(|| ContributionError::NotFound {
                uri: uri.to_string(),
            })
    }

    pub fn is_locked(&self, uri: &str) -> bool {
        self.contributions.get(uri).is_some_and(|c| c.is_locked())
    }

    /// Every deployable holding a lock, across all contributions
    pub fn deployed(&self) -> Vec<QName> {
        let mut deployed: Vec<QName> = self
            .contributions
            .iter()
            .flat_map(|c| c.lock_owners.iter().cloned().collect::<Vec<_>>())
            .collect();
        deployed.sort();
        deployed
    }
}

impl ContributionLookup for ContributionRegistry {
    fn extensions(&self, contribution: &str) -> Vec<String> {
        self.contributions
            .get(contribution)
            .map(|c| c.extends.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ComponentDefinition;

    fn bar() -> QName {
        QName::new("urn:test", "bar")
    }

    fn contribution() -> Contribution {
        Contribution::new("test")
            .with_deployable(
                Composite::new(bar(), "test").with_component(ComponentDefinition::atomic("component", "rust")),
            )
            .with_extension("ext")
    }

    #[test]
    fn test_install_and_find() {
        let registry = ContributionRegistry::new();
        registry.install(contribution()).unwrap();

        let (uri, composite) = registry.find_deployable(&bar()).unwrap();
        assert_eq!(uri, "test");
        assert_eq!(composite.name, bar());
        assert_eq!(registry.extensions("test"), vec!["ext".to_string()]);
        assert_eq!(
            registry.install(contribution()),
            Err(ContributionError::AlreadyInstalled {
                uri: "test".to_string()
            })
        );
    }

    #[test]
    fn test_locked_contribution_cannot_be_removed() {
        let registry = ContributionRegistry::new();
        registry.install(contribution()).unwrap();
        registry.acquire_lock("test", &bar()).unwrap();

        assert!(registry.is_locked("test"));
        assert_eq!(registry.deployed(), vec![bar()]);
        assert!(matches!(
            registry.remove("test"),
            Err(ContributionError::Locked { .. })
        ));

        registry.release_lock("test", &bar()).unwrap();
        assert!(registry.remove("test").is_ok());
        assert!(!registry.contains("test"));
    }

    #[test]
    fn test_mismatched_deployable_is_rejected() {
        let registry = ContributionRegistry::new();
        let result = registry.install(
            Contribution::new("test").with_deployable(Composite::new(bar(), "other")),
        );
        assert!(matches!(result, Err(ContributionError::Mismatch { .. })));
    }
}
