//! # Generator
//!
//! Compiles the logical model into a [`Deployment`]: per-zone ordered command
//! batches plus zone-independent context commands.
//!
//! Generation is a pure function of the model and the extension tracker's
//! current counts. It never mutates either; the tracker keys a deployment
//! acquires or gives up are listed on the deployment and applied by the
//! caller.
//!
//! ## Modes
//!
//! - **Incremental**: builds `New` nodes and disposes `MarkedForDeletion` ones.
//! - **Full**: builds every node that is not marked for deletion, used to
//!   bring a zone that lost its state back to the desired state.
//!
//! ## Zone batch order
//!
//! Removals run before additions:
//!
//! ```text
//! detach connections → dispose components → dispose channels → dispose resources
//! → detach extensions → unprovision modules → un-provision extensions
//! → provision extensions → provision modules → attach extensions
//! → build resources → build channels → build components → attach connections
//! → start components
//! ```

mod deployment;
mod physical;
mod plan;

pub use deployment::Deployment;
pub use physical::{
    ComponentGenerator, ImplementationGenerator, ResourceGenerator, SettingsResourceGenerator,
};

use crate::command::{Command, ConnectionDirection, PhysicalChannel, PhysicalConnection};
use crate::config::GeneratorConfig;
use crate::constants::UNASSIGNED_ZONE;
use crate::definition::QName;
use crate::extension_tracker::ExtensionTracker;
use crate::model::{
    LogicalChannel, LogicalComponent, LogicalCompositeComponent, LogicalNode, LogicalResource,
    LogicalState,
};
use dashmap::DashMap;
use plan::ZonePlan;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("No generator registered for {kind} (required by {uri})")]
    GeneratorNotFound { kind: String, uri: String },

    #[error("Node {uri} does not belong to a deployable")]
    MissingDeployable { uri: String },

    #[error("Cannot generate {uri}: {reason}")]
    Component { uri: String, reason: String },
}

/// Extension modules a contribution's code depends on
pub trait ContributionLookup: Send + Sync {
    fn extensions(&self, contribution: &str) -> Vec<String>;
}

/// Lookup for runtimes where no contribution extends another module
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtensions;

impl ContributionLookup for NoExtensions {
    fn extensions(&self, _contribution: &str) -> Vec<String> {
        Vec::new()
    }
}

pub struct Generator {
    component_generators: DashMap<String, Arc<dyn ComponentGenerator>>,
    resource_generators: DashMap<String, Arc<dyn ResourceGenerator>>,
    tracker: Arc<ExtensionTracker>,
    contributions: Arc<dyn ContributionLookup>,
    local_zone: String,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("component_kinds", &self.component_kinds())
            .field("resource_kinds", &self.resource_kinds())
            .field("local_zone", &self.local_zone)
            .finish()
    }
}

impl Generator {
    pub fn new(
        tracker: Arc<ExtensionTracker>,
        contributions: Arc<dyn ContributionLookup>,
        local_zone: impl Into<String>,
    ) -> Self {
        Self {
            component_generators: DashMap::new(),
            resource_generators: DashMap::new(),
            tracker,
            contributions,
            local_zone: local_zone.into(),
        }
    }

    /// Generator with the default generators registered for the configured kinds
    pub fn from_config(
        config: &GeneratorConfig,
        tracker: Arc<ExtensionTracker>,
        contributions: Arc<dyn ContributionLookup>,
        local_zone: impl Into<String>,
    ) -> Self {
        let generator = Self::new(tracker, contributions, local_zone);
        for kind in &config.component_types {
            generator.register_component_generator(kind, Arc::new(ImplementationGenerator));
        }
        for kind in &config.resource_types {
            generator.register_resource_generator(kind, Arc::new(SettingsResourceGenerator));
        }
        generator
    }

    pub fn register_component_generator(
        &self,
        kind: impl Into<String>,
        generator: Arc<dyn ComponentGenerator>,
    ) {
        self.component_generators.insert(kind.into(), generator);
    }

    pub fn register_resource_generator(
        &self,
        kind: impl Into<String>,
        generator: Arc<dyn ResourceGenerator>,
    ) {
        self.resource_generators.insert(kind.into(), generator);
    }

    pub fn component_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self
            .component_generators
            .iter()
            .map(|e| e.key().clone())
            .collect();
        kinds.sort();
        kinds
    }

    pub fn resource_kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self
            .resource_generators
            .iter()
            .map(|e| e.key().clone())
            .collect();
        kinds.sort();
        kinds
    }

    pub fn local_zone(&self) -> &str {
        &self.local_zone
    }

    /// Generate commands for every node under `composite`
    pub fn generate(
        &self,
        composite: &LogicalCompositeComponent,
        incremental: bool,
    ) -> Result<Deployment, GenerationError> {
        self.generate_scoped(composite, None, incremental)
    }

    /// Generate commands only for nodes belonging to `deployables`
    pub fn generate_for(
        &self,
        composite: &LogicalCompositeComponent,
        deployables: &[QName],
        incremental: bool,
    ) -> Result<Deployment, GenerationError> {
        self.generate_scoped(composite, Some(deployables), incremental)
    }

    #[instrument(skip(self, composite), fields(composite = %composite.uri()))]
    fn generate_scoped(
        &self,
        composite: &LogicalCompositeComponent,
        scope: Option<&[QName]>,
        incremental: bool,
    ) -> Result<Deployment, GenerationError> {
        let mut pass = Pass {
            incremental,
            scope,
            zones: BTreeMap::new(),
            started: BTreeSet::new(),
            stopped: BTreeSet::new(),
        };

        for level in composite.composites() {
            for resource in level.resources() {
                self.visit_resource(&mut pass, resource)?;
            }
            for channel in level.channels() {
                self.visit_channel(&mut pass, channel)?;
            }
            for node in level.components() {
                if let LogicalNode::Atomic(component) = node {
                    self.visit_component(&mut pass, component)?;
                }
            }
        }

        let mut deployment = Deployment::new();
        for deployable in &pass.stopped {
            deployment.push_global(Command::StopContext {
                deployable: deployable.clone(),
            });
        }
        for (zone, mut plan) in pass.zones {
            self.plan_modules(&zone, &mut plan, incremental, &mut deployment);
            deployment.add_zone_commands(&zone, plan.into_commands());
        }
        for deployable in &pass.started {
            deployment.push_global(Command::StartContext {
                deployable: deployable.clone(),
            });
        }

        debug!(
            incremental = incremental,
            commands = deployment.command_count(),
            claims = deployment.extension_claims().len(),
            releases = deployment.extension_releases().len(),
            "Generated deployment"
        );
        Ok(deployment)
    }

    fn zone_of<'a>(&'a self, zone: &'a str) -> &'a str {
        if zone == UNASSIGNED_ZONE {
            &self.local_zone
        } else {
            zone
        }
    }

    fn visit_resource(&self, pass: &mut Pass<'_>, resource: &LogicalResource) -> Result<(), GenerationError> {
        let Some(action) = pass.action(resource.state, resource.deployable.as_ref()) else {
            return Ok(());
        };
        let generator = self
            .resource_generators
            .get(&resource.definition.kind)
            .map(|g| Arc::clone(g.value()))
            .ok_or_else(|| GenerationError::GeneratorNotFound {
                kind: resource.definition.kind.clone(),
                uri: resource.uri.clone(),
            })?;
        let physical = generator.generate(resource)?;
        let plan = pass.plan(self.zone_of(&resource.zone));
        match action {
            Action::Build => plan.build_resources.push(physical),
            Action::Dispose => plan.dispose_resources.push(physical),
        }
        pass.track_context(action, resource.deployable.as_ref());
        Ok(())
    }

    fn visit_channel(&self, pass: &mut Pass<'_>, channel: &LogicalChannel) -> Result<(), GenerationError> {
        let Some(action) = pass.action(channel.state, channel.deployable.as_ref()) else {
            return Ok(());
        };
        let physical = PhysicalChannel {
            uri: channel.uri.clone(),
            deployable: physical::deployable_of(&channel.uri, channel.deployable.as_ref())?,
        };
        let plan = pass.plan(self.zone_of(&channel.zone));
        match action {
            Action::Build => plan.build_channels.push(physical),
            Action::Dispose => plan.dispose_channels.push(physical),
        }
        pass.track_context(action, channel.deployable.as_ref());
        Ok(())
    }

    fn visit_component(
        &self,
        pass: &mut Pass<'_>,
        component: &LogicalComponent,
    ) -> Result<(), GenerationError> {
        let zone = self.zone_of(&component.zone);
        if component.state == LogicalState::Provisioned {
            pass.plan(zone)
                .retained_modules
                .insert(component.contribution().to_string());
        }
        let Some(action) = pass.action(component.state, component.deployable.as_ref()) else {
            return Ok(());
        };

        let kind = component.definition().implementation_kind();
        let generator = self
            .component_generators
            .get(kind)
            .map(|g| Arc::clone(g.value()))
            .ok_or_else(|| GenerationError::GeneratorNotFound {
                kind: kind.to_string(),
                uri: component.uri().to_string(),
            })?;
        let physical = generator.generate(component)?;
        let connections = connections_of(component);
        let plan = pass.plan(zone);

        match action {
            Action::Build => {
                plan.incoming_modules
                    .insert(component.contribution().to_string());
                if physical.eager_init {
                    plan.start.push(physical.uri.clone());
                }
                plan.build_components.push(physical);
                plan.attach.extend(connections);
            }
            Action::Dispose => {
                plan.outgoing_modules
                    .insert(component.contribution().to_string());
                plan.dispose_components.push(physical);
                plan.detach.extend(connections);
            }
        }
        pass.track_context(action, component.deployable.as_ref());
        Ok(())
    }

    /// Decide module and extension commands for one zone
    ///
    /// A module is provisioned when the first component of its contribution
    /// arrives in the zone and unprovisioned when the last one leaves.
    /// Extensions are provisioned only when the tracker holds no reference
    /// for the zone and un-provisioned when this deployment releases the last
    /// one.
    fn plan_modules(
        &self,
        zone: &str,
        plan: &mut ZonePlan,
        incremental: bool,
        deployment: &mut Deployment,
    ) {
        let provisioned: Vec<String> = if incremental {
            plan.incoming_modules
                .difference(&plan.retained_modules)
                .cloned()
                .collect()
        } else {
            plan.incoming_modules.iter().cloned().collect()
        };
        let unprovisioned: Vec<String> = if incremental {
            plan.outgoing_modules
                .iter()
                .filter(|m| !plan.retained_modules.contains(*m) && !plan.incoming_modules.contains(*m))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        let mut claims: BTreeMap<String, i64> = BTreeMap::new();
        let mut releases: BTreeMap<String, i64> = BTreeMap::new();

        for contribution in &unprovisioned {
            for extension in self.contributions.extensions(contribution) {
                let key = ExtensionTracker::key(zone, &extension);
                *releases.entry(extension.clone()).or_default() += 1;
                deployment.release_extension(key);
                plan.detach_extensions
                    .push((contribution.clone(), extension));
            }
            plan.unprovision_modules.push(contribution.clone());
        }
        for contribution in &provisioned {
            for extension in self.contributions.extensions(contribution) {
                if incremental {
                    let key = ExtensionTracker::key(zone, &extension);
                    *claims.entry(extension.clone()).or_default() += 1;
                    deployment.claim_extension(key);
                } else {
                    plan.provision_extensions.insert(extension.clone());
                }
                plan.attach_extensions
                    .push((contribution.clone(), extension));
            }
            plan.provision_modules.push(contribution.clone());
        }

        let touched: BTreeSet<&String> = claims.keys().chain(releases.keys()).collect();
        for extension in touched {
            let count = self.tracker.count(&ExtensionTracker::key(zone, extension));
            let claimed = claims.get(extension).copied().unwrap_or(0);
            let released = releases.get(extension).copied().unwrap_or(0);
            if count == 0 && claimed > 0 {
                plan.provision_extensions.insert(extension.clone());
            } else if count > 0 && count - released + claimed <= 0 {
                plan.unprovision_extensions.insert(extension.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Build,
    Dispose,
}

/// Mutable state of one generation pass
struct Pass<'a> {
    incremental: bool,
    scope: Option<&'a [QName]>,
    zones: BTreeMap<String, ZonePlan>,
    started: BTreeSet<QName>,
    stopped: BTreeSet<QName>,
}

impl Pass<'_> {
    fn action(&self, state: LogicalState, deployable: Option<&QName>) -> Option<Action> {
        if let Some(scope) = self.scope {
            if !deployable.is_some_and(|d| scope.contains(d)) {
                return None;
            }
        }
        match (self.incremental, state) {
            (true, LogicalState::New) => Some(Action::Build),
            (true, LogicalState::MarkedForDeletion) => Some(Action::Dispose),
            (true, LogicalState::Provisioned) => None,
            (false, LogicalState::MarkedForDeletion) => None,
            (false, _) => Some(Action::Build),
        }
    }

    fn plan(&mut self, zone: &str) -> &mut ZonePlan {
        self.zones.entry(zone.to_string()).or_default()
    }

    fn track_context(&mut self, action: Action, deployable: Option<&QName>) {
        let Some(deployable) = deployable else {
            return;
        };
        match action {
            Action::Build => self.started.insert(deployable.clone()),
            Action::Dispose => self.stopped.insert(deployable.clone()),
        };
    }
}

fn connections_of(component: &LogicalComponent) -> Vec<PhysicalConnection> {
    let produced = component.producers.iter().flat_map(|p| {
        p.targets.iter().map(|channel| PhysicalConnection {
            source: p.uri.clone(),
            channel: channel.clone(),
            direction: ConnectionDirection::Produce,
        })
    });
    let consumed = component.consumers.iter().flat_map(|c| {
        c.sources.iter().map(|channel| PhysicalConnection {
            source: c.uri.clone(),
            channel: channel.clone(),
            direction: ConnectionDirection::Consume,
        })
    });
    produced.chain(consumed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Collector;
    use crate::command::{ChannelAction, CommandType};
    use crate::definition::{
        ChannelDefinition, Composite, ComponentDefinition, ProducerDefinition, ResourceDefinition,
    };
    use crate::instantiator::LogicalModelInstantiator;
    use std::collections::HashMap;

    const DOMAIN: &str = "fabric3://domain";
    const ZONE: &str = "LocalZone";

    #[derive(Default)]
    struct Extensions(HashMap<String, Vec<String>>);

    impl ContributionLookup for Extensions {
        fn extensions(&self, contribution: &str) -> Vec<String> {
            self.0.get(contribution).cloned().unwrap_or_default()
        }
    }

    fn qname(local: &str) -> QName {
        QName::new("urn:test", local)
    }

    fn generator_with(tracker: Arc<ExtensionTracker>, lookup: Extensions) -> Generator {
        let config = GeneratorConfig::default();
        Generator::from_config(&config, tracker, Arc::new(lookup), ZONE)
    }

    fn generator() -> Generator {
        generator_with(Arc::new(ExtensionTracker::new()), Extensions::default())
    }

    fn domain_with(composites: &[Composite]) -> LogicalCompositeComponent {
        let mut root = LogicalCompositeComponent::domain(DOMAIN);
        for composite in composites {
            let context = LogicalModelInstantiator::new().include(composite, &mut root);
            assert!(!context.has_errors(), "{:?}", context.errors());
        }
        root
    }

    fn types(commands: &[Command]) -> Vec<CommandType> {
        commands.iter().map(Command::command_type).collect()
    }

    fn position(commands: &[Command], predicate: impl Fn(&Command) -> bool) -> usize {
        commands.iter().position(predicate).unwrap()
    }

    #[test]
    fn test_single_component_deployment() {
        let root = domain_with(&[
            Composite::new(qname("bar"), "test").with_component(ComponentDefinition::atomic("component", "rust")),
        ]);
        let deployment = generator().generate(&root, true).unwrap();

        assert_eq!(deployment.zones().collect::<Vec<_>>(), vec![ZONE]);
        assert_eq!(
            types(deployment.zone_commands(ZONE)),
            vec![CommandType::ProvisionClassloader, CommandType::BuildComponent]
        );
        assert_eq!(
            deployment.global(),
            &[Command::StartContext { deployable: qname("bar") }]
        );
    }

    #[test]
    fn test_build_ordering() {
        let root = domain_with(&[Composite::new(qname("bar"), "test")
            .with_resource(ResourceDefinition::new("db", "datasource"))
            .with_channel(ChannelDefinition::new("events"))
            .with_component(
                ComponentDefinition::atomic("publisher", "rust")
                    .with_producer(ProducerDefinition::new("out").with_target("events"))
                    .eager(),
            )]);
        let deployment = generator().generate(&root, true).unwrap();
        let commands = deployment.zone_commands(ZONE);

        let module = position(commands, |c| c.command_type() == CommandType::ProvisionClassloader);
        let resources = position(commands, |c| c.command_type() == CommandType::BuildResources);
        let channel = position(commands, |c| {
            matches!(c, Command::ChannelConnection(ChannelAction::BuildChannel { .. }))
        });
        let build = position(commands, |c| c.command_type() == CommandType::BuildComponent);
        let attach = position(commands, |c| {
            matches!(c, Command::ChannelConnection(ChannelAction::Attach { .. }))
        });
        let start = position(commands, |c| c.command_type() == CommandType::StartComponent);

        assert!(module < build);
        assert!(resources < build);
        assert!(channel < start);
        assert!(attach < start);
        assert!(build < attach);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let root = domain_with(&[Composite::new(qname("bar"), "test")
            .with_channel(ChannelDefinition::new("events"))
            .with_component(ComponentDefinition::atomic("a", "rust"))
            .with_component(ComponentDefinition::atomic("b", "system"))]);
        let generator = generator();

        let first = generator.generate(&root, true).unwrap();
        let second = generator.generate(&root, true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_generator() {
        let root = domain_with(&[
            Composite::new(qname("bar"), "test").with_component(ComponentDefinition::atomic("a", "wasm")),
        ]);
        let error = generator().generate(&root, true).unwrap_err();
        assert_eq!(
            error,
            GenerationError::GeneratorNotFound {
                kind: "wasm".to_string(),
                uri: "fabric3://domain/a".to_string(),
            }
        );
    }

    #[test]
    fn test_provisioned_nodes_are_skipped_incrementally() {
        let mut root = domain_with(&[
            Composite::new(qname("bar"), "test").with_component(ComponentDefinition::atomic("a", "rust")),
        ]);
        Collector::new().mark_as_provisioned(&[qname("bar")], &mut root);

        let generator = generator();
        assert!(generator.generate(&root, true).unwrap().is_empty());

        let full = generator.generate(&root, false).unwrap();
        assert_eq!(
            types(full.zone_commands(ZONE)),
            vec![CommandType::ProvisionClassloader, CommandType::BuildComponent]
        );
        assert!(full.extension_claims().is_empty());
    }

    #[test]
    fn test_undeploy_ordering() {
        let mut root = domain_with(&[Composite::new(qname("bar"), "test")
            .with_channel(ChannelDefinition::new("events"))
            .with_component(
                ComponentDefinition::atomic("publisher", "rust")
                    .with_producer(ProducerDefinition::new("out").with_target("events")),
            )]);
        let collector = Collector::new();
        collector.mark_as_provisioned(&[qname("bar")], &mut root);
        collector.mark_for_deletion(&qname("bar"), &mut root);

        let deployment = generator().generate(&root, true).unwrap();
        let commands = deployment.zone_commands(ZONE);
        let detach = position(commands, |c| {
            matches!(c, Command::ChannelConnection(ChannelAction::Detach { .. }))
        });
        let dispose = position(commands, |c| c.command_type() == CommandType::DisposeComponent);
        let dispose_channel = position(commands, |c| {
            matches!(c, Command::ChannelConnection(ChannelAction::DisposeChannel { .. }))
        });
        let module = position(commands, |c| c.command_type() == CommandType::UnprovisionClassloader);

        assert!(detach < dispose);
        assert!(dispose < dispose_channel);
        assert!(dispose < module);
        assert_eq!(deployment.global_before().len(), 1);
        assert!(deployment.global_after().is_empty());
    }

    #[test]
    fn test_module_shared_by_deployables_of_one_contribution() {
        let mut root = domain_with(&[
            Composite::new(qname("first"), "test").with_component(ComponentDefinition::atomic("a", "rust")),
        ]);
        Collector::new().mark_as_provisioned(&[qname("first")], &mut root);
        let context = LogicalModelInstantiator::new().include(
            &Composite::new(qname("second"), "test").with_component(ComponentDefinition::atomic("b", "rust")),
            &mut root,
        );
        assert!(!context.has_errors());

        let deployment = generator().generate(&root, true).unwrap();
        assert_eq!(
            types(deployment.zone_commands(ZONE)),
            vec![CommandType::BuildComponent]
        );
    }

    #[test]
    fn test_scoped_generation_ignores_other_deployables() {
        let root = domain_with(&[
            Composite::new(qname("first"), "one").with_component(ComponentDefinition::atomic("a", "rust")),
            Composite::new(qname("second"), "two").with_component(ComponentDefinition::atomic("b", "rust")),
        ]);
        let deployment = generator().generate_for(&root, &[qname("second")], true).unwrap();

        assert!(deployment.zone_commands(ZONE).iter().all(|c| match c {
            Command::BuildComponent(component) => component.uri == "fabric3://domain/b",
            Command::ProvisionClassloader { contribution } => contribution == "two",
            _ => false,
        }));
        assert_eq!(
            deployment.global(),
            &[Command::StartContext { deployable: qname("second") }]
        );
    }

    #[test]
    fn test_extension_provisioned_once_per_zone() {
        let tracker = Arc::new(ExtensionTracker::new());
        let mut lookup = Extensions::default();
        lookup.0.insert("test".to_string(), vec!["ext".to_string()]);
        let generator = generator_with(Arc::clone(&tracker), lookup);
        let root = domain_with(&[
            Composite::new(qname("bar"), "test").with_component(ComponentDefinition::atomic("a", "rust")),
        ]);

        let first = generator.generate(&root, true).unwrap();
        assert_eq!(
            types(first.zone_commands(ZONE)),
            vec![
                CommandType::ProvisionExtensions,
                CommandType::ProvisionClassloader,
                CommandType::AttachExtension,
                CommandType::BuildComponent,
            ]
        );
        assert_eq!(first.extension_claims(), &["LocalZone::ext".to_string()]);

        // another consumer already holds the extension
        tracker.increment("LocalZone::ext");
        let second = generator.generate(&root, true).unwrap();
        assert!(!types(second.zone_commands(ZONE)).contains(&CommandType::ProvisionExtensions));
        assert_eq!(second.extension_claims(), &["LocalZone::ext".to_string()]);
    }

    #[test]
    fn test_extension_unprovisioned_with_last_consumer() {
        let tracker = Arc::new(ExtensionTracker::new());
        let mut lookup = Extensions::default();
        lookup.0.insert("test".to_string(), vec!["ext".to_string()]);
        let generator = generator_with(Arc::clone(&tracker), lookup);
        let mut root = domain_with(&[
            Composite::new(qname("bar"), "test").with_component(ComponentDefinition::atomic("a", "rust")),
        ]);
        let collector = Collector::new();
        collector.mark_as_provisioned(&[qname("bar")], &mut root);
        collector.mark_for_deletion(&qname("bar"), &mut root);
        tracker.increment("LocalZone::ext");

        let deployment = generator.generate(&root, true).unwrap();
        assert_eq!(
            types(deployment.zone_commands(ZONE)),
            vec![
                CommandType::DisposeComponent,
                CommandType::DetachExtension,
                CommandType::UnprovisionClassloader,
                CommandType::UnProvisionExtensions,
            ]
        );
        assert_eq!(deployment.extension_releases(), &["LocalZone::ext".to_string()]);

        tracker.increment("LocalZone::ext");
        let shared = generator.generate(&root, true).unwrap();
        assert!(!types(shared.zone_commands(ZONE)).contains(&CommandType::UnProvisionExtensions));
    }

    #[test]
    fn test_assigned_zone_gets_its_own_batch() {
        let mut root = domain_with(&[
            Composite::new(qname("bar"), "test").with_component(ComponentDefinition::atomic("a", "rust")),
        ]);
        root.for_each_component_mut(&mut |component| component.zone = "zone1".to_string());

        let deployment = generator().generate(&root, true).unwrap();
        assert_eq!(deployment.zones().collect::<Vec<_>>(), vec!["zone1"]);
        assert!(deployment.zone_commands(ZONE).is_empty());
    }
}
