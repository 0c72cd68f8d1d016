mod common;

use common::*;
use fabric_core::command::CommandType;
use fabric_core::definition::{ComponentDefinition, Composite, ReferenceDefinition};
use fabric_core::LogicalState;
use fabric_core::runtime::ComponentManager;
use std::time::Duration;
use tokio::time::{sleep, timeout};

#[tokio::test]
async fn test_operations_on_one_contribution_are_serialized() {
    let handle = bootstrap();
    let bar = qname("bar");
    install(&handle, "test", composite_of(&bar, "test", &["a"]));
    let gate = gate_command(
        &handle,
        CommandType::BuildComponent,
        "BuildComponent fabric3://domain/a",
        false,
    );

    let (included, undeployed) = tokio::join!(handle.domain.include(&bar), async {
        gate.reached.notified().await;
        // the undeploy only sees the deployable if it waits for the include
        let (undeployed, ()) = tokio::join!(handle.domain.undeploy("test", false), async {
            sleep(Duration::from_millis(20)).await;
            gate.release.notify_one();
        });
        undeployed
    });

    included.unwrap();
    undeployed.unwrap();
    assert!(handle.domain.deployed().is_empty());
    assert!(handle.domain.root().get_component("fabric3://domain/a").is_none());
    assert!(handle.runtime.is_empty());
    assert!(handle.contributions.lock_owners("test").unwrap().is_empty());
}

#[tokio::test]
async fn test_disjoint_contributions_proceed_independently() {
    let handle = bootstrap();
    let bar = qname("bar");
    let baz = qname("baz");
    install(&handle, "first", composite_of(&bar, "first", &["a"]));
    install(&handle, "second", composite_of(&baz, "second", &["b"]));
    let gate = gate_command(
        &handle,
        CommandType::BuildComponent,
        "BuildComponent fabric3://domain/a",
        false,
    );

    let (first, second) = tokio::join!(handle.domain.include(&bar), async {
        gate.reached.notified().await;
        let second = timeout(Duration::from_secs(5), handle.domain.include(&baz)).await;
        assert!(!handle.runtime.has_component("fabric3://domain/a"));
        gate.release.notify_one();
        second
    });

    first.unwrap();
    second.expect("include of a disjoint contribution completes").unwrap();
    let mut deployed = handle.domain.deployed();
    deployed.sort();
    assert_eq!(deployed, vec![bar, baz]);
    assert!(handle.runtime.is_started("fabric3://domain/a"));
    assert!(handle.runtime.is_started("fabric3://domain/b"));
}

#[tokio::test]
async fn test_failed_include_keeps_in_flight_undeploy_recoverable() {
    let handle = bootstrap();
    let bar = qname("bar");
    let broken = qname("broken");
    install(&handle, "first", composite_of(&bar, "first", &["stable"]));
    install(
        &handle,
        "second",
        Composite::new(broken.clone(), "second").with_component(
            ComponentDefinition::atomic("client", "rust")
                .with_reference(ReferenceDefinition::new("calc", "Calc").with_target("missing")),
        ),
    );
    handle.domain.include(&bar).await.unwrap();
    let gate = gate_command(
        &handle,
        CommandType::DisposeComponent,
        "DisposeComponent fabric3://domain/stable",
        true,
    );

    let (undeployed, included) = tokio::join!(handle.domain.undeploy("first", false), async {
        gate.reached.notified().await;
        let included = handle.domain.include(&broken).await;
        gate.release.notify_one();
        included
    });

    assert!(included.is_err());
    assert!(undeployed.is_err());
    {
        let root = handle.domain.root();
        let node = root
            .get_component("fabric3://domain/stable")
            .expect("marked component survives a concurrent failed include");
        assert_eq!(node.component().state, LogicalState::Provisioned);
        assert!(root.get_component("fabric3://domain/client").is_none());
    }
    assert_eq!(handle.domain.deployed(), vec![bar.clone()]);
    assert!(handle.runtime.has_component("fabric3://domain/stable"));
    assert_eq!(handle.contributions.lock_owners("first").unwrap(), vec![bar]);

    handle.domain.undeploy("first", false).await.unwrap();
    assert!(handle.runtime.is_empty());
}
