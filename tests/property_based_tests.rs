use fabric_core::collector::Collector;
use fabric_core::config::GeneratorConfig;
use fabric_core::constants::UNTRACKED;
use fabric_core::definition::{Composite, ComponentDefinition, QName};
use fabric_core::extension_tracker::ExtensionTracker;
use fabric_core::generator::{Generator, NoExtensions};
use fabric_core::instantiator::LogicalModelInstantiator;
use fabric_core::{CommandType, LogicalCompositeComponent};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

const ZONE: &str = "LocalZone";

fn component_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z][a-z0-9]{0,7}", 1..8)
}

fn model_of(names: &BTreeSet<String>) -> (LogicalCompositeComponent, QName) {
    let deployable = QName::new("urn:test", "bar");
    let composite = names.iter().fold(
        Composite::new(deployable.clone(), "test"),
        |composite, name| composite.with_component(ComponentDefinition::atomic(name.as_str(), "rust")),
    );
    let mut root = LogicalCompositeComponent::domain("fabric3://domain");
    LogicalModelInstantiator::new()
        .include(&composite, &mut root)
        .into_result(&deployable)
        .unwrap();
    (root, deployable)
}

fn generator() -> Generator {
    Generator::from_config(
        &GeneratorConfig::default(),
        Arc::new(ExtensionTracker::new()),
        Arc::new(NoExtensions),
        ZONE,
    )
}

proptest! {
    /// Property: the count after n acquisitions and m <= n releases is n - m
    #[test]
    fn tracker_counts_acquisitions(acquired in 1usize..20, released_fraction in 0.0f64..=1.0) {
        let released = ((acquired as f64) * released_fraction) as usize;
        let tracker = ExtensionTracker::new();
        let key = ExtensionTracker::key(ZONE, "ext");

        for _ in 0..acquired {
            tracker.increment(&key);
        }
        let mut last = acquired as i64;
        for _ in 0..released {
            last = tracker.decrement(&key);
        }

        let expected = (acquired - released) as i64;
        prop_assert_eq!(tracker.count(&key), expected);
        prop_assert_eq!(tracker.is_tracked(&key), expected > 0);
        if released > 0 {
            prop_assert_eq!(last, expected);
        }
        if expected == 0 {
            prop_assert_eq!(tracker.decrement(&key), UNTRACKED);
        }
    }

    /// Property: generation is a pure function of the model
    #[test]
    fn generation_is_idempotent(names in component_names()) {
        let (root, _) = model_of(&names);
        let generator = generator();

        let first = generator.generate(&root, true).unwrap();
        let second = generator.generate(&root, true).unwrap();
        prop_assert_eq!(&first, &second);

        let builds = first
            .zone_commands(ZONE)
            .iter()
            .filter(|c| c.command_type() == CommandType::BuildComponent)
            .count();
        prop_assert_eq!(builds, names.len());
    }

    /// Property: once provisioned, an incremental generation has nothing to do
    /// while a full generation still describes every component
    #[test]
    fn provisioned_model_generates_nothing_incrementally(names in component_names()) {
        let (mut root, deployable) = model_of(&names);
        Collector::new().mark_as_provisioned(&[deployable], &mut root);
        let generator = generator();

        prop_assert!(generator.generate(&root, true).unwrap().is_empty());
        let full = generator.generate(&root, false).unwrap();
        let builds = full
            .zone_commands(ZONE)
            .iter()
            .filter(|c| c.command_type() == CommandType::BuildComponent)
            .count();
        prop_assert_eq!(builds, names.len());
    }

    /// Property: pruning a deployable removes everything it contributed
    #[test]
    fn prune_restores_empty_domain(names in component_names()) {
        let (mut root, deployable) = model_of(&names);
        let removed = Collector::new().prune(&[deployable], &mut root);
        prop_assert_eq!(removed, names.len());
        prop_assert_eq!(root, LogicalCompositeComponent::domain("fabric3://domain"));
    }
}
