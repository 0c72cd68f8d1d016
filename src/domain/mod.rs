//! # Domain
//!
//! Façade over the deployment pipeline: include and undeploy deployable
//! composites, recover them at restart, and expose the logical model for
//! introspection.
//!
//! ## Pipeline
//!
//! ```text
//! include:  lock contribution → instantiate → allocate → generate → claim extensions
//!           → deploy → mark provisioned → lock owners + journal
//! undeploy: lock contribution → mark for deletion → generate → release extensions
//!           → deploy → collect → release lock owners + journal
//! ```
//!
//! Everything up to and including generation runs inside one write section
//! of the model lock; deployment runs without it so that introspection and
//! includes of other contributions proceed concurrently. Operations on the
//! same contribution are serialized by a per-contribution async lock held
//! for the whole pipeline.
//!
//! A failed include prunes everything it added, so the model and journal
//! are exactly as before the call. A failed undeploy restores the nodes it
//! marked unless `force` is set.

mod allocator;
mod contribution;
mod journal;
mod listener;

pub use allocator::{AllocationError, Allocator, SingleZoneAllocator};
pub use contribution::{Contribution, ContributionError, ContributionRegistry};
pub use journal::{DomainJournal, FileJournal, InMemoryJournal, JournalEntry, JournalError};
pub use listener::DeployListener;

use crate::collector::Collector;
use crate::constants::operations;
use crate::definition::{Composite, QName};
use crate::deployer::{Deployer, DeploymentPackage};
use crate::error::{FabricError, Result};
use crate::extension_tracker::ExtensionTracker;
use crate::generator::{Deployment, Generator};
use crate::instantiator::LogicalModelInstantiator;
use crate::logging::log_deployment_operation;
use crate::model::LogicalCompositeComponent;
use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, instrument, warn};

/// Deployables of one contribution taking part in an operation
type Batch = Vec<(String, Arc<Composite>)>;

pub struct Domain {
    root: Arc<RwLock<LogicalCompositeComponent>>,
    instantiator: LogicalModelInstantiator,
    collector: Collector,
    generator: Arc<Generator>,
    deployer: Arc<Deployer>,
    tracker: Arc<ExtensionTracker>,
    contributions: Arc<ContributionRegistry>,
    allocator: Option<Arc<dyn Allocator>>,
    journal: Arc<dyn DomainJournal>,
    listeners: RwLock<Vec<Arc<dyn DeployListener>>>,
    contribution_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("uri", &self.root.read().uri())
            .field("deployed", &self.deployed())
            .field("allocator", &self.allocator.is_some())
            .finish()
    }
}

impl Domain {
    pub fn new(
        domain_uri: &str,
        generator: Arc<Generator>,
        deployer: Arc<Deployer>,
        tracker: Arc<ExtensionTracker>,
        contributions: Arc<ContributionRegistry>,
        journal: Arc<dyn DomainJournal>,
    ) -> Self {
        Self {
            root: Arc::new(RwLock::new(LogicalCompositeComponent::domain(domain_uri))),
            instantiator: LogicalModelInstantiator::new(),
            collector: Collector::new(),
            generator,
            deployer,
            tracker,
            contributions,
            allocator: None,
            journal,
            listeners: RwLock::new(Vec::new()),
            contribution_locks: DashMap::new(),
        }
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    pub fn add_listener(&self, listener: Arc<dyn DeployListener>) {
        self.listeners.write().push(listener);
    }

    pub fn contributions(&self) -> &Arc<ContributionRegistry> {
        &self.contributions
    }

    pub fn tracker(&self) -> &Arc<ExtensionTracker> {
        &self.tracker
    }

    /// Read access to the logical model; do not hold across `.await`
    pub fn root(&self) -> RwLockReadGuard<'_, LogicalCompositeComponent> {
        self.root.read()
    }

    /// Active deployables
    pub fn deployed(&self) -> Vec<QName> {
        self.contributions.deployed()
    }

    /// Include one deployable composite
    #[instrument(skip(self), fields(deployable = %name))]
    pub async fn include(&self, name: &QName) -> Result<()> {
        let (uri, composite) = self.contributions.find_deployable(name)?;
        let _guard = self.lock_contribution(&uri).await;
        if self.contributions.lock_owners(&uri)?.contains(name) {
            return Err(FabricError::AlreadyDeployed(name.clone()));
        }
        self.deploy_batch(vec![(uri, composite)]).await
    }

    /// Include every deployable of the given contributions in one deployment
    ///
    /// Deployables that are already active are skipped.
    #[instrument(skip(self))]
    pub async fn include_contributions(&self, uris: &[String]) -> Result<()> {
        let _guards = self.lock_contributions(uris).await;

        let mut batch = Batch::new();
        for uri in uris {
            let contribution = self
                .contributions
                .get(uri)
                .ok_or_else(|| ContributionError::NotFound { uri: uri.clone() })?;
            for deployable in contribution.deployables() {
                if contribution.lock_owners().contains(&deployable.name) {
                    debug!(deployable = %deployable.name, "Skipping active deployable");
                    continue;
                }
                batch.push((uri.clone(), Arc::clone(deployable)));
            }
        }
        if batch.is_empty() {
            info!("No deployables to include");
            return Ok(());
        }
        self.deploy_batch(batch).await
    }

    /// Undeploy every active deployable of a contribution
    #[instrument(skip(self))]
    pub async fn undeploy(&self, contribution_uri: &str, force: bool) -> Result<()> {
        let _guard = self.lock_contribution(contribution_uri).await;
        let owners = self.contributions.lock_owners(contribution_uri)?;
        if owners.is_empty() {
            info!(contribution = %contribution_uri, "Nothing deployed from contribution");
            return Ok(());
        }
        let batch = owners
            .into_iter()
            .map(|name| (contribution_uri.to_string(), name))
            .collect();
        self.undeploy_batch(batch, force).await
    }

    /// Undeploy a single deployable composite
    #[instrument(skip(self), fields(deployable = %name))]
    pub async fn undeploy_composite(&self, name: &QName, force: bool) -> Result<()> {
        let (uri, _) = self.contributions.find_deployable(name)?;
        let _guard = self.lock_contribution(&uri).await;
        if !self.contributions.lock_owners(&uri)?.contains(name) {
            return Err(FabricError::NotDeployed(name.clone()));
        }
        self.undeploy_batch(vec![(uri, name.clone())], force).await
    }

    /// Re-include every deployable recorded in the journal
    ///
    /// Entries whose contribution is no longer installed are skipped.
    /// Returns the deployables that were recovered.
    #[instrument(skip(self))]
    pub async fn recover(&self) -> Result<Vec<QName>> {
        let entries = self.journaled(|journal| journal.load_all()).await?;
        let mut by_contribution: BTreeMap<String, Vec<QName>> = BTreeMap::new();
        for entry in entries {
            by_contribution
                .entry(entry.contribution)
                .or_default()
                .push(entry.deployable);
        }

        let uris: Vec<String> = by_contribution.keys().cloned().collect();
        let _guards = self.lock_contributions(&uris).await;

        let mut batch = Batch::new();
        for (uri, names) in by_contribution {
            let Some(contribution) = self.contributions.get(&uri) else {
                warn!(contribution = %uri, "Journaled contribution is not installed, skipping");
                continue;
            };
            for name in names {
                if contribution.lock_owners().contains(&name) {
                    continue;
                }
                match contribution.deployable(&name) {
                    Some(composite) => batch.push((uri.clone(), Arc::clone(composite))),
                    None => warn!(
                        contribution = %uri,
                        deployable = %name,
                        "Journaled deployable no longer provided, skipping"
                    ),
                }
            }
        }

        let recovered: Vec<QName> = batch.iter().map(|(_, c)| c.name.clone()).collect();
        if !recovered.is_empty() {
            self.deploy_batch(batch).await?;
        }
        log_deployment_operation(
            operations::RECOVER,
            None,
            None,
            "completed",
            Some(&format!("{} deployables", recovered.len())),
        );
        Ok(recovered)
    }

    async fn deploy_batch(&self, batch: Batch) -> Result<()> {
        let names: Vec<QName> = batch.iter().map(|(_, c)| c.name.clone()).collect();
        for name in &names {
            self.notify(|l| l.on_deploy(name));
        }

        let (current, full) = self.prepare_include(&batch, &names)?;

        let package = DeploymentPackage::new(current, full);
        if let Err(e) = self.deployer.deploy(&package).await {
            self.revert_extensions(package.current());
            self.collector.prune(&names, &mut self.root.write());
            for name in &names {
                log_deployment_operation(
                    operations::INCLUDE,
                    Some(&name.to_string()),
                    None,
                    "failed",
                    Some(&e.to_string()),
                );
            }
            return Err(e.into());
        }

        self.collector
            .mark_as_provisioned(&names, &mut self.root.write());
        for (uri, composite) in &batch {
            self.contributions.acquire_lock(uri, &composite.name)?;
            let (deployable, contribution) = (composite.name.clone(), uri.clone());
            let recorded = self
                .journaled(move |journal| journal.record(&deployable, &contribution))
                .await;
            if let Err(e) = recorded {
                error!(deployable = %composite.name, error = %e, "Failed to journal included deployable");
            }
            log_deployment_operation(
                operations::INCLUDE,
                Some(&composite.name.to_string()),
                None,
                "completed",
                None,
            );
            self.notify(|l| l.on_deploy_completed(&composite.name));
        }
        Ok(())
    }

    /// Instantiate, allocate and generate under one model write section
    ///
    /// Any failure prunes the batch before returning.
    fn prepare_include(&self, batch: &Batch, names: &[QName]) -> Result<(Deployment, Deployment)> {
        let mut root = self.root.write();
        let result = self.instantiate_and_generate(batch, names, &mut root);
        match result {
            Ok(deployments) => {
                self.apply_extensions(&deployments.0);
                Ok(deployments)
            }
            Err(e) => {
                let pruned = self.collector.prune(names, &mut root);
                warn!(error = %e, pruned = pruned, "Include failed before deployment, pruned model");
                Err(e)
            }
        }
    }

    fn instantiate_and_generate(
        &self,
        batch: &Batch,
        names: &[QName],
        root: &mut LogicalCompositeComponent,
    ) -> Result<(Deployment, Deployment)> {
        for (_, composite) in batch {
            self.instantiator
                .include(composite, root)
                .into_result(&composite.name)?;
        }
        if let Some(allocator) = &self.allocator {
            allocator.allocate(root, names)?;
        }
        let current = self.generator.generate_for(root, names, true)?;
        let full = self.generator.generate(root, false)?;
        Ok((current, full))
    }

    async fn undeploy_batch(&self, batch: Vec<(String, QName)>, force: bool) -> Result<()> {
        let names: Vec<QName> = batch.iter().map(|(_, n)| n.clone()).collect();
        for name in &names {
            self.notify(|l| l.on_undeploy(name));
        }

        let prepared = self.prepare_undeploy(&names);
        let outcome = match prepared {
            Ok((current, full)) => {
                let package = DeploymentPackage::new(current, full);
                match self.deployer.deploy(&package).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        if !force {
                            self.revert_extensions(package.current());
                        }
                        Err(FabricError::from(e))
                    }
                }
            }
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            if !force {
                let mut root = self.root.write();
                for name in &names {
                    self.collector.unmark(name, &mut root);
                }
                return Err(e);
            }
            warn!(error = %e, "Forced undeploy continuing after failure");
        }

        self.collector.collect(&names, &mut self.root.write());
        for (uri, name) in &batch {
            self.contributions.release_lock(uri, name)?;
            let deployable = name.clone();
            let forgotten = self
                .journaled(move |journal| journal.forget(&deployable))
                .await;
            if let Err(e) = forgotten {
                error!(deployable = %name, error = %e, "Failed to remove deployable from journal");
            }
            log_deployment_operation(
                operations::UNDEPLOY,
                Some(&name.to_string()),
                None,
                "completed",
                force.then_some("forced"),
            );
            self.notify(|l| l.on_undeploy_completed(name));
        }
        Ok(())
    }

    fn prepare_undeploy(&self, names: &[QName]) -> Result<(Deployment, Deployment)> {
        let mut root = self.root.write();
        for name in names {
            self.collector.mark_for_deletion(name, &mut root);
        }
        let current = self.generator.generate_for(&root, names, true)?;
        let full = self.generator.generate(&root, false)?;
        self.apply_extensions(&current);
        Ok((current, full))
    }

    fn apply_extensions(&self, deployment: &Deployment) {
        for key in deployment.extension_claims() {
            self.tracker.increment(key);
        }
        for key in deployment.extension_releases() {
            self.tracker.decrement(key);
        }
    }

    fn revert_extensions(&self, deployment: &Deployment) {
        for key in deployment.extension_claims() {
            self.tracker.decrement(key);
        }
        for key in deployment.extension_releases() {
            self.tracker.increment(key);
        }
    }

    fn notify(&self, callback: impl Fn(&dyn DeployListener)) {
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            callback(listener.as_ref());
        }
    }

    /// Run a journal operation on the blocking pool
    async fn journaled<T, F>(&self, operation: F) -> std::result::Result<T, JournalError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DomainJournal) -> std::result::Result<T, JournalError> + Send + 'static,
    {
        let journal = Arc::clone(&self.journal);
        tokio::task::spawn_blocking(move || operation(journal.as_ref())).await?
    }

    async fn lock_contribution(&self, uri: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(
            self.contribution_locks
                .entry(uri.to_string())
                .or_default()
                .value(),
        );
        lock.lock_owned().await
    }

    /// Lock several contributions in URI order
    async fn lock_contributions(&self, uris: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<&String> = uris.iter().collect();
        sorted.sort();
        sorted.dedup();
        let mut guards = Vec::with_capacity(sorted.len());
        for uri in sorted {
            guards.push(self.lock_contribution(uri).await);
        }
        guards
    }
}
