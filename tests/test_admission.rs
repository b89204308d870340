
use std::sync::Arc;
use std::sync::atomic::Ordering;

use collaborator_mock::{FlakyInstaller, UnreachableTopologySource, controller_with, core_edge_topology, logging_controller};
use rt_admission_control::domain::admission::outcome::{AdmissionStatus, RemovalStatus};
use rt_admission_control::domain::admission::request::{AdmissionRequest, MulticastJoin, RemovalRequest};
use rt_admission_control::domain::collaborator::flow_installer::{GroupCommand, InstallerCall};
use rt_admission_control::domain::collaborator::topology_source::StaticTopologySource;
use rt_admission_control::domain::flow::rt_properties::RealTimeProperties;
use rt_admission_control::domain::topology::path::Path;
use rt_admission_control::domain::utils::id::NodeId;

fn path(nodes: &[&str]) -> Path {
    nodes.iter().copied().collect()
}

fn rt_flow() -> RealTimeProperties {
    RealTimeProperties::new(0.01, 0.02, 0.05, 5)
}

#[tokio::test]
async fn test_single_flow_on_two_switches_is_accepted() {
    let (mut controller, installer) = logging_controller();

    let outcome = controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.6", rt_flow())).await;

    assert_eq!(outcome.status, AdmissionStatus::Accepted);
    assert_eq!(outcome.path, Some(path(&["1", "2"])));
    let end_to_end = outcome.end_to_end.unwrap();
    assert!((end_to_end - (2.0 * 0.01 + 0.0001)).abs() < 1e-9, "end-to-end delay was {}", end_to_end);
    assert!(end_to_end <= 0.05);

    assert_eq!(controller.registry().len(), 1);
    assert_eq!(installer.calls().await.len(), 1);
}

#[tokio::test]
async fn test_nine_higher_priority_flows_reject_the_candidate() {
    let (mut controller, _installer) = logging_controller();

    for index in 0..9 {
        let background = AdmissionRequest::new(format!("10.0.1.{}", index), "10.0.0.11", RealTimeProperties::new(0.01, 0.02, 1.0, 10));
        let outcome = controller.admit(&background).await;
        assert_eq!(outcome.status, AdmissionStatus::Accepted);
        assert_eq!(outcome.path, Some(path(&["1", "2", "3"])));
    }

    let outcome = controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.6", rt_flow())).await;

    assert_eq!(outcome.status, AdmissionStatus::RejectedScheduling);
    let violation = outcome.violation.unwrap();
    assert!(violation.is_candidate);
    assert_eq!(violation.node, Some(NodeId::new("1")));
    assert_eq!(controller.registry().len(), 9);
}

#[tokio::test]
async fn test_higher_priority_candidate_cannot_break_admitted_flow() {
    let (mut controller, _installer) = logging_controller();

    let tight = controller.admit(&AdmissionRequest::new("10.0.0.2", "10.0.0.7", RealTimeProperties::new(0.02, 0.1, 0.045, 1))).await;
    assert_eq!(tight.status, AdmissionStatus::Accepted);

    let outcome = controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.6", RealTimeProperties::new(0.02, 0.1, 0.5, 9))).await;

    assert_eq!(outcome.status, AdmissionStatus::RejectedScheduling);
    assert!(!outcome.violation.unwrap().is_candidate);
    assert_eq!(controller.registry().len(), 1);
}

#[tokio::test]
async fn test_admitting_twice_yields_exists() {
    let (mut controller, installer) = logging_controller();
    let request = AdmissionRequest::new("10.0.0.1", "10.0.0.11", rt_flow());

    assert_eq!(controller.admit(&request).await.status, AdmissionStatus::Accepted);
    assert_eq!(controller.admit(&request).await.status, AdmissionStatus::Exists);

    assert_eq!(controller.registry().len(), 1);
    assert_eq!(installer.calls().await.len(), 1, "an installed flow must not be installed again");
}

#[tokio::test]
async fn test_same_contract_to_another_subscriber_is_a_new_flow() {
    let (mut controller, installer) = logging_controller();

    let to_edge = controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.11", rt_flow())).await;
    let to_core = controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.6", rt_flow())).await;

    assert_eq!(to_edge.status, AdmissionStatus::Accepted);
    assert_eq!(to_core.status, AdmissionStatus::Accepted);
    assert_eq!(to_core.path, Some(path(&["1", "2"])));
    assert_eq!(controller.registry().len(), 2);
    assert_eq!(installer.calls().await.len(), 2);

    assert_eq!(controller.remove(&RemovalRequest::new("10.0.0.1", "10.0.0.6")).await.status, RemovalStatus::Deleted);
    assert_eq!(controller.remove(&RemovalRequest::new("10.0.0.1", "10.0.0.11")).await.status, RemovalStatus::Deleted);
    assert!(controller.registry().is_empty());
}

#[tokio::test]
async fn test_removal_deletes_then_reports_not_found() {
    let (mut controller, installer) = logging_controller();
    controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.6", rt_flow())).await;

    let removal = RemovalRequest::new("10.0.0.1", "10.0.0.6");
    let first = controller.remove(&removal).await;
    let second = controller.remove(&removal).await;

    assert_eq!(first.status, RemovalStatus::Deleted);
    assert_eq!(first.removed.len(), 1);
    assert_eq!(second.status, RemovalStatus::NotFound);
    assert!(controller.registry().is_empty());

    match installer.calls().await.last() {
        Some(InstallerCall::DeletePath(delete)) => assert_eq!(delete.nodes, vec![NodeId::new("1"), NodeId::new("2")]),
        other => panic!("expected a delete, got {:?}", other),
    }
}

#[tokio::test]
async fn test_same_inputs_give_same_decision() {
    let requests: Vec<AdmissionRequest> = (0..4)
        .map(|index| AdmissionRequest::new(format!("10.0.1.{}", index), "10.0.0.11", RealTimeProperties::new(0.005, 0.05, 0.2, index)))
        .collect();
    let candidate = AdmissionRequest::new("10.0.0.3", "10.0.0.12", RealTimeProperties::new(0.01, 0.05, 0.1, 2));

    let mut decisions = Vec::new();
    for _ in 0..2 {
        let (mut controller, _installer) = logging_controller();
        for request in &requests {
            controller.admit(request).await;
        }
        let outcome = controller.admit(&candidate).await;
        decisions.push((outcome.status, outcome.path, outcome.end_to_end, outcome.violation));
    }

    assert_eq!(decisions[0], decisions[1]);
}

#[tokio::test]
async fn test_failed_install_keeps_pending_entry_and_is_retried() {
    let installer = Arc::new(FlakyInstaller::new(5, 0));
    let mut controller = controller_with(installer.clone(), Arc::new(StaticTopologySource::new(core_edge_topology())));
    let request = AdmissionRequest::new("10.0.0.1", "10.0.0.11", rt_flow());

    let outcome = controller.admit(&request).await;

    assert_eq!(outcome.status, AdmissionStatus::InstallFailed);
    assert!(outcome.flow_id.is_some());
    assert_eq!(controller.registry().pending_installs(), vec![outcome.flow_id.unwrap()]);

    // Two failures left: the re-dispatch triggered by the duplicate request succeeds on its third attempt.
    assert_eq!(controller.admit(&request).await.status, AdmissionStatus::Exists);
    assert!(controller.registry().pending_installs().is_empty());
    assert_eq!(installer.install_failures.load(Ordering::SeqCst), 0);
    assert_eq!(installer.calls().await.len(), 1);
}

#[tokio::test]
async fn test_retry_pending_installs() {
    let installer = Arc::new(FlakyInstaller::new(3, 0));
    let mut controller = controller_with(installer.clone(), Arc::new(StaticTopologySource::new(core_edge_topology())));

    let outcome = controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.11", rt_flow())).await;
    assert_eq!(outcome.status, AdmissionStatus::InstallFailed);

    let installed = controller.retry_pending_installs().await;

    assert_eq!(installed, vec![outcome.flow_id.unwrap()]);
    assert!(controller.registry().all()[0].is_installed());
}

#[tokio::test]
async fn test_transient_install_failure_is_absorbed_by_retry() {
    let installer = Arc::new(FlakyInstaller::new(2, 0));
    let mut controller = controller_with(installer.clone(), Arc::new(StaticTopologySource::new(core_edge_topology())));

    let outcome = controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.11", rt_flow())).await;

    assert_eq!(outcome.status, AdmissionStatus::Accepted);
    assert!(controller.registry().all()[0].is_installed());
}

#[tokio::test]
async fn test_failed_uninstall_keeps_the_flow() {
    let installer = Arc::new(FlakyInstaller::new(0, 3));
    let mut controller = controller_with(installer.clone(), Arc::new(StaticTopologySource::new(core_edge_topology())));
    controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.6", rt_flow())).await;
    let removal = RemovalRequest::new("10.0.0.1", "10.0.0.6");

    let failed = controller.remove(&removal).await;
    assert_eq!(failed.status, RemovalStatus::UninstallFailed);
    assert_eq!(controller.registry().len(), 1);

    assert_eq!(controller.remove(&removal).await.status, RemovalStatus::Deleted);
    assert!(controller.registry().is_empty());
}

#[tokio::test]
async fn test_unreachable_topology_source() {
    let source = Arc::new(UnreachableTopologySource::default());
    let installer = Arc::new(FlakyInstaller::new(0, 0));
    let mut controller = controller_with(installer.clone(), source.clone());

    let outcome = controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.6", rt_flow())).await;

    assert_eq!(outcome.status, AdmissionStatus::TopologyUnavailable);
    assert_eq!(source.attempts.load(Ordering::SeqCst), 3);
    assert!(controller.registry().is_empty());
    assert!(installer.calls().await.is_empty());
}

#[tokio::test]
async fn test_every_admission_sees_the_current_topology() {
    let source = Arc::new(StaticTopologySource::new(core_edge_topology()));
    let installer = Arc::new(FlakyInstaller::new(0, 0));
    let mut controller = controller_with(installer, source.clone());

    let before = controller.admit(&AdmissionRequest::new("10.0.0.1", "10.0.0.11", rt_flow())).await;
    source.remove_link(&NodeId::new("2"), &NodeId::new("3")).await;
    let after = controller.admit(&AdmissionRequest::new("10.0.0.2", "10.0.0.12", rt_flow())).await;
    source.remove_link(&NodeId::new("4"), &NodeId::new("3")).await;
    let cut_off = controller.admit(&AdmissionRequest::new("10.0.0.3", "10.0.0.13", rt_flow())).await;

    assert_eq!(before.path, Some(path(&["1", "2", "3"])));
    assert_eq!(after.path, Some(path(&["1", "4", "3"])));
    assert_eq!(cut_off.status, AdmissionStatus::Rejected);
}

#[tokio::test]
async fn test_multicast_tree_grows_with_every_join() {
    let (mut controller, installer) = logging_controller();

    let first = controller.join_multicast(&MulticastJoin::new("10.0.0.11", "10.0.0.5")).await;
    let second = controller.join_multicast(&MulticastJoin::new("10.0.0.6", "10.0.0.5")).await;
    let unknown = controller.join_multicast(&MulticastJoin::new("10.0.0.99", "10.0.0.5")).await;

    assert_eq!(first.status, AdmissionStatus::Joined);
    let tree = second.tree.unwrap();
    assert_eq!(tree.root, NodeId::new("1"));
    assert_eq!(tree.next_hops_of(&NodeId::new("1")), &[NodeId::new("2")]);
    assert_eq!(tree.next_hops_of(&NodeId::new("2")), &[NodeId::new("3")]);
    assert_eq!(unknown.status, AdmissionStatus::Joined);

    let group = controller.groups().get(&"10.0.0.5".into()).unwrap();
    assert_eq!(group.group_id, 1);
    assert_eq!(group.subscribers.len(), 3);
    assert!(controller.registry().is_empty(), "joins are not registered as real-time flows");
    assert!(installer.calls().await.iter().all(|call| matches!(call, InstallerCall::InstallGroup(_))));
}

#[tokio::test]
async fn test_switch_leaving_the_multicast_tree_is_cleared() {
    let source = Arc::new(StaticTopologySource::new(core_edge_topology()));
    let installer = Arc::new(FlakyInstaller::new(0, 0));
    let mut controller = controller_with(installer.clone(), source.clone());

    controller.join_multicast(&MulticastJoin::new("10.0.0.11", "10.0.0.5")).await;
    source.remove_link(&NodeId::new("2"), &NodeId::new("3")).await;
    let rerouted = controller.join_multicast(&MulticastJoin::new("10.0.0.12", "10.0.0.5")).await;

    let tree = rerouted.tree.unwrap();
    assert_eq!(tree.next_hops_of(&NodeId::new("1")), &[NodeId::new("4")]);
    assert!(tree.next_hops_of(&NodeId::new("2")).is_empty());

    let cleared: Vec<_> = installer
        .calls()
        .await
        .into_iter()
        .filter_map(|call| match call {
            InstallerCall::InstallGroup(group) if group.node == NodeId::new("2") => Some(group),
            _ => None,
        })
        .collect();
    assert_eq!(cleared.len(), 2);
    assert_eq!(cleared[1].command, GroupCommand::Modify);
    assert!(cleared[1].buckets.is_empty());
}

#[tokio::test]
async fn test_multicast_join_to_unknown_broker_is_rejected() {
    let (mut controller, installer) = logging_controller();

    let outcome = controller.join_multicast(&MulticastJoin::new("10.0.0.11", "10.9.9.9")).await;

    assert_eq!(outcome.status, AdmissionStatus::Rejected);
    assert!(controller.groups().is_empty());
    assert!(installer.calls().await.is_empty());
}
