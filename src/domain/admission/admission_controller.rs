use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::admission::multicast_groups::MulticastGroups;
use crate::domain::admission::outcome::{AdmissionOutcome, AdmissionStatus, RemovalOutcome, RemovalStatus};
use crate::domain::admission::request::{AdmissionRequest, MulticastJoin, RemovalRequest};
use crate::domain::analysis::analysis_config::AnalysisConfig;
use crate::domain::analysis::schedule_analyzer::{FlowUnderAnalysis, ScheduleAnalyzer, Verdict};
use crate::domain::collaborator::dispatch_config::DispatchConfig;
use crate::domain::collaborator::endpoint_resolver::EndpointResolver;
use crate::domain::collaborator::flow_installer::{FlowInstaller, GroupBucket, GroupInstall, HopOutput, MatchCriteria, PathDelete, PathInstall};
use crate::domain::collaborator::retry::RetryPolicy;
use crate::domain::collaborator::topology_source::TopologySource;
use crate::domain::flow::flow_entry::{FlowEntry, InstallState};
use crate::domain::flow::flow_registry::FlowRegistry;
use crate::domain::topology::path::Path;
use crate::domain::topology::routing_engine::{BucketWeight, RoutingEngine};
use crate::domain::utils::id::{EndpointId, FlowId, NodeId};
use crate::error::{Error, Result};

/// Steps an admission request passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionStage {
    Received,
    TopologyRefreshed,
    PathSelected,
    Analyzed,
    Installed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStage {
    Received,
    Found,
    NotFound,
    Uninstalled,
}

fn enter_stage<S: std::fmt::Debug>(label: &str, stage: S) {
    log::trace!("[{}] {:?}", label, stage);
}

fn record_decision(publisher: &EndpointId, subscriber: &EndpointId, outcome: &AdmissionOutcome) {
    tracing::info!(
        publisher = %publisher,
        subscriber = %subscriber,
        status = ?outcome.status,
        path_len = outcome.path.as_ref().map_or(0, Path::len),
        end_to_end = ?outcome.end_to_end,
        "Admission decision"
    );
}

/// Single owner of the routing view, the flow registry and the multicast
/// groups. Admission, removal and join run one at a time against it; the
/// [`ControllerHandle`](crate::domain::admission::controller_handle::ControllerHandle)
/// provides that serialization for concurrent callers.
pub struct AdmissionController {
    routing: RoutingEngine,
    analyzer: ScheduleAnalyzer,
    registry: FlowRegistry,
    groups: MulticastGroups,
    dispatch: DispatchConfig,
    retry: RetryPolicy,
    topology_source: Arc<dyn TopologySource>,
    installer: Arc<dyn FlowInstaller>,
    resolver: Arc<dyn EndpointResolver>,
}

impl AdmissionController {
    pub fn new(
        analysis: AnalysisConfig,
        dispatch: DispatchConfig,
        topology_source: Arc<dyn TopologySource>,
        installer: Arc<dyn FlowInstaller>,
        resolver: Arc<dyn EndpointResolver>,
    ) -> Self {
        let retry = dispatch.retry_policy();
        Self {
            routing: RoutingEngine::new(),
            analyzer: ScheduleAnalyzer::new(analysis),
            registry: FlowRegistry::new(),
            groups: MulticastGroups::new(),
            dispatch,
            retry,
            topology_source,
            installer,
            resolver,
        }
    }

    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    pub fn groups(&self) -> &MulticastGroups {
        &self.groups
    }

    /// Admission state machine for a point-to-point flow.
    ///
    /// A request never leaves partial state behind when it is rejected. Once
    /// the analysis passes, the flow is recorded first and installed second;
    /// a failed install keeps the entry as pending instead of rolling back.
    pub async fn admit(&mut self, request: &AdmissionRequest) -> AdmissionOutcome {
        let label = format!("{} -> {}", request.src, request.dst);
        enter_stage(&label, AdmissionStage::Received);

        if let Err(e) = self.refresh_topology().await {
            log::error!("Admission of {} aborted: {}", label, e);
            let outcome = AdmissionOutcome::with_status(AdmissionStatus::TopologyUnavailable);
            record_decision(&request.src, &request.dst, &outcome);
            return outcome;
        }
        enter_stage(&label, AdmissionStage::TopologyRefreshed);

        let subscribers = BTreeSet::from([request.dst.clone()]);
        let existing = self.registry.find(&request.src, &subscribers, &request.properties).map(|entry| (entry.id, entry.is_installed()));
        if let Some((flow_id, installed)) = existing {
            if !installed {
                log::info!("Flow {} is registered but not installed, dispatching its install again.", flow_id);
                if let Err(e) = self.dispatch_install(flow_id).await {
                    log::error!("Flow {} is still not installed: {}", flow_id, e);
                }
            }
            let outcome = AdmissionOutcome::with_status(AdmissionStatus::Exists);
            record_decision(&request.src, &request.dst, &outcome);
            return outcome;
        }

        let path = match self.select_path(&request.src, &request.dst) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Flow {} rejected: {}", label, e);
                enter_stage(&label, AdmissionStage::Rejected);
                let outcome = AdmissionOutcome::with_status(AdmissionStatus::Rejected);
                record_decision(&request.src, &request.dst, &outcome);
                return outcome;
            }
        };
        enter_stage(&label, AdmissionStage::PathSelected);

        let verdict = self.analyzer.analyze(FlowUnderAnalysis::new(&request.src, &request.properties, &path), &self.registry);
        enter_stage(&label, AdmissionStage::Analyzed);

        let end_to_end = match verdict {
            Verdict::Schedulable { end_to_end } => end_to_end,
            Verdict::Violation(violation) => {
                let error = Error::SchedulingViolation { publisher: violation.publisher.clone(), node: violation.node.clone() };
                tracing::warn!(
                    error = %error,
                    node = ?violation.node,
                    candidate = violation.is_candidate,
                    reason = ?violation.reason,
                    "Flow {} rejected by schedulability analysis",
                    label
                );
                enter_stage(&label, AdmissionStage::Rejected);
                let outcome = AdmissionOutcome::rejected_scheduling(violation);
                record_decision(&request.src, &request.dst, &outcome);
                return outcome;
            }
        };

        let entry = FlowEntry::new(request.src.clone(), subscribers, request.properties, path.clone());
        let flow_id = self.registry.add(entry);

        let status = match self.dispatch_install(flow_id).await {
            Ok(()) => {
                enter_stage(&label, AdmissionStage::Installed);
                AdmissionStatus::Accepted
            }
            Err(e) => {
                log::error!("Flow {} admitted but its forwarding state is missing: {}", flow_id, e);
                AdmissionStatus::InstallFailed
            }
        };

        let outcome = AdmissionOutcome::admitted(status, flow_id, path, end_to_end);
        record_decision(&request.src, &request.dst, &outcome);
        outcome
    }

    /// Delete-then-forget for every flow from `src` to exactly `{dst}`.
    pub async fn remove(&mut self, request: &RemovalRequest) -> RemovalOutcome {
        let label = format!("{} -> {}", request.src, request.dst);
        enter_stage(&label, RemovalStage::Received);

        let subscribers = BTreeSet::from([request.dst.clone()]);
        let targets: Vec<(FlowId, Vec<NodeId>)> = self
            .registry
            .find_by_flow_key(&request.src, &subscribers)
            .iter()
            .map(|entry| (entry.id, entry.path.nodes().to_vec()))
            .collect();

        if targets.is_empty() {
            enter_stage(&label, RemovalStage::NotFound);
            log::info!("Removal rejected: {}", Error::UnknownFlow { publisher: request.src.clone(), subscriber: request.dst.clone() });
            return RemovalOutcome { status: RemovalStatus::NotFound, removed: Vec::new() };
        }
        enter_stage(&label, RemovalStage::Found);

        let match_criteria = MatchCriteria::ipv4(&request.src, &request.dst);
        let installer = self.installer.clone();
        let retry = self.retry;

        let mut removed = Vec::new();
        let mut failed = false;
        for (flow_id, nodes) in targets {
            let delete = PathDelete { flow_id, nodes, match_criteria: match_criteria.clone() };

            match retry.run("Path delete", || installer.delete_path(&delete)).await {
                Ok(()) => {
                    self.registry.remove(flow_id);
                    removed.push(flow_id);
                }
                Err(e) => {
                    log::error!("Flow {} stays registered, its forwarding state could not be deleted: {}", flow_id, e);
                    failed = true;
                }
            }
        }

        let status = if failed { RemovalStatus::UninstallFailed } else { RemovalStatus::Deleted };
        if !failed {
            enter_stage(&label, RemovalStage::Uninstalled);
        }

        tracing::info!(publisher = %request.src, subscriber = %request.dst, status = ?status, removed = removed.len(), "Removal decision");

        RemovalOutcome { status, removed }
    }

    /// Adds the subscriber to the broker's group and re-installs the whole
    /// multicast tree. Joins are not checked for schedulability.
    pub async fn join_multicast(&mut self, join: &MulticastJoin) -> AdmissionOutcome {
        if let Err(e) = self.refresh_topology().await {
            log::error!("Multicast join of {} to {} aborted: {}", join.subscriber, join.broker, e);
            return AdmissionOutcome::with_status(AdmissionStatus::TopologyUnavailable);
        }

        let Some(root) = self.resolver.resolve(&join.broker) else {
            log::warn!("Multicast join rejected: {}", Error::EndpointUnresolved(join.broker.clone()));
            let outcome = AdmissionOutcome::with_status(AdmissionStatus::Rejected);
            record_decision(&join.broker, &join.subscriber, &outcome);
            return outcome;
        };

        let group = self.groups.join(&join.broker, &join.subscriber);
        let group_id = group.group_id;
        let subscribers = group.subscribers.clone();

        let mut destinations = Vec::with_capacity(subscribers.len());
        for subscriber in &subscribers {
            match self.resolver.resolve(subscriber) {
                Some(node) => destinations.push(node),
                None => log::warn!("Multicast subscriber {} left out of the tree: {}", subscriber, Error::EndpointUnresolved(subscriber.clone())),
            }
        }

        // Rebuilt from scratch on every join.
        let tree = self.routing.find_multicast_tree(&root, &destinations);

        let match_criteria = MatchCriteria::ipv4(&join.broker, &self.dispatch.multicast_group_address);
        let installer = self.installer.clone();
        let retry = self.retry;
        let mut status = AdmissionStatus::Joined;

        let mut node_buckets: Vec<(NodeId, Vec<GroupBucket>)> = Vec::with_capacity(tree.next_hops.len());
        for (node, next_hops) in &tree.next_hops {
            let mut buckets = Vec::with_capacity(next_hops.len());
            for next_hop in next_hops {
                match self.routing.get_port(node, next_hop) {
                    Some(port) => buckets.push(GroupBucket { next_hop: next_hop.clone(), port }),
                    None => log::error!("No port on {} towards {}, bucket skipped.", node, next_hop),
                }
            }
            node_buckets.push((node.clone(), buckets));
        }

        // Switches that dropped out of the tree keep the group, emptied.
        for node in self.groups.stale_nodes(&join.broker, tree.next_hops.keys()) {
            log::info!("Node {} left the tree of group {}, clearing its buckets.", node, group_id);
            node_buckets.push((node, Vec::new()));
        }

        for (node, buckets) in node_buckets {
            let group = GroupInstall {
                node: node.clone(),
                group_id,
                command: self.groups.command_for(&join.broker, &node),
                buckets,
                match_criteria: match_criteria.clone(),
                priority: self.dispatch.group_flow_priority,
            };

            match retry.run("Group install", || installer.install_group(&group)).await {
                Ok(()) => self.groups.mark_installed(&join.broker, &node),
                Err(e) => {
                    log::error!("Group {} could not be installed on {}: {}", group_id, node, e);
                    status = AdmissionStatus::InstallFailed;
                }
            }
        }

        let outcome = AdmissionOutcome::joined(status, tree);
        record_decision(&join.broker, &join.subscriber, &outcome);
        outcome
    }

    /// Dispatches the installs of every flow still pending. Returns the flows
    /// that are installed now.
    pub async fn retry_pending_installs(&mut self) -> Vec<FlowId> {
        if let Err(e) = self.refresh_topology().await {
            log::warn!("Retrying pending installs on the previous topology: {}", e);
        }

        let mut installed = Vec::new();
        for flow_id in self.registry.pending_installs() {
            match self.dispatch_install(flow_id).await {
                Ok(()) => installed.push(flow_id),
                Err(e) => log::error!("Flow {} is still not installed: {}", flow_id, e),
            }
        }

        if !installed.is_empty() {
            log::info!("Installed {} pending flows.", installed.len());
        }

        installed
    }

    pub fn flows(&self) -> Vec<FlowEntry> {
        self.registry.all().to_vec()
    }

    /// Every simple path between two switches on the current topology, with
    /// cost and bucket weight.
    pub async fn paths(&mut self, src: &NodeId, dst: &NodeId) -> Result<Vec<BucketWeight>> {
        self.refresh_topology().await?;
        let paths = self.routing.find_all_paths(src, dst);
        Ok(self.routing.calculate_bucket_weight(&paths))
    }

    async fn refresh_topology(&mut self) -> Result<()> {
        let source = self.topology_source.clone();
        let snapshot = self.retry.run("Topology refresh", || source.fetch()).await.map_err(|e| Error::TopologyUnavailable(e.to_string()))?;

        self.routing.update_topology(&snapshot);
        Ok(())
    }

    fn select_path(&self, src: &EndpointId, dst: &EndpointId) -> Result<Path> {
        let src_node = self.resolver.resolve(src).ok_or_else(|| Error::EndpointUnresolved(src.clone()))?;
        let dst_node = self.resolver.resolve(dst).ok_or_else(|| Error::EndpointUnresolved(dst.clone()))?;

        self.routing.find_shortest_path(&src_node, &dst_node).ok_or_else(|| Error::NoPath { src: src_node.clone(), dst: dst_node.clone() })
    }

    fn path_install(&self, flow_id: FlowId) -> Result<PathInstall> {
        let entry = self.registry.get(flow_id).ok_or_else(|| Error::InstallDispatch(format!("flow {} is not registered", flow_id)))?;
        let subscriber = entry
            .subscribers
            .iter()
            .next()
            .ok_or_else(|| Error::InstallDispatch(format!("flow {} has no subscriber", flow_id)))?;

        let mut hops = Vec::with_capacity(entry.path.hop_count());
        for (from, to) in entry.path.hops() {
            let out_port = self
                .routing
                .get_port(from, to)
                .ok_or_else(|| Error::InstallDispatch(format!("no port on {} towards {}", from, to)))?;
            hops.push(HopOutput { node: from.clone(), out_port });
        }

        Ok(PathInstall {
            flow_id,
            hops,
            priority: entry.properties.pi,
            match_criteria: MatchCriteria::ipv4(&entry.publisher, subscriber),
            queue_class: self.dispatch.queue_class(entry.properties.pi),
        })
    }

    async fn dispatch_install(&mut self, flow_id: FlowId) -> Result<()> {
        let install = self.path_install(flow_id)?;
        let installer = self.installer.clone();

        self.retry
            .run("Path install", || installer.install_path(&install))
            .await
            .map_err(|e| Error::InstallDispatch(e.to_string()))?;

        self.registry.set_install_state(flow_id, InstallState::Installed);
        Ok(())
    }
}
