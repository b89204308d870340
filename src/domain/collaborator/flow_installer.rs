use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::utils::id::{EndpointId, FlowId, GroupId, NodeId, PortNo};
use crate::error::Result;

pub const ETH_TYPE_IPV4: u16 = 0x0800;

/// Egress queue a flow is put into on every hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueClass {
    BestEffort,
    RealTime,
}

impl QueueClass {
    /// Priorities below `rt_threshold` are real-time traffic.
    pub fn from_priority(pi: i64, rt_threshold: i64) -> Self {
        if pi < rt_threshold { QueueClass::RealTime } else { QueueClass::BestEffort }
    }

    /// Queue number configured on the switch ports.
    pub fn queue_id(&self) -> u32 {
        match self {
            QueueClass::BestEffort => 0,
            QueueClass::RealTime => 1,
        }
    }
}

/// IP-layer predicate a flow rule matches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCriteria {
    pub eth_type: u16,
    pub ipv4_src: EndpointId,
    pub ipv4_dst: EndpointId,
}

impl MatchCriteria {
    pub fn ipv4(src: &EndpointId, dst: &EndpointId) -> Self {
        Self { eth_type: ETH_TYPE_IPV4, ipv4_src: src.clone(), ipv4_dst: dst.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HopOutput {
    pub node: NodeId,
    pub out_port: PortNo,
}

/// Forwarding rules for one admitted flow: one output per hop, the last node
/// of the path excluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInstall {
    pub flow_id: FlowId,
    pub hops: Vec<HopOutput>,
    pub priority: i64,
    pub match_criteria: MatchCriteria,
    pub queue_class: QueueClass,
}

/// Removes the rules of a flow from every node of its recorded path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDelete {
    pub flow_id: FlowId,
    pub nodes: Vec<NodeId>,
    pub match_criteria: MatchCriteria,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupBucket {
    pub next_hop: NodeId,
    pub port: PortNo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupCommand {
    Add,
    /// The group already exists on the node and its buckets are replaced.
    Modify,
}

/// Replication group on one node of a multicast tree, plus the flow rule that
/// steers the group traffic into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInstall {
    pub node: NodeId,
    pub group_id: GroupId,
    pub command: GroupCommand,
    pub buckets: Vec<GroupBucket>,
    pub match_criteria: MatchCriteria,
    pub priority: i64,
}

/// Pushes forwarding state to the switches.
///
/// Calls are remote and fallible; the controller wraps each of them in its
/// retry policy.
#[async_trait]
pub trait FlowInstaller: Send + Sync {
    async fn install_path(&self, install: &PathInstall) -> Result<()>;

    async fn delete_path(&self, delete: &PathDelete) -> Result<()>;

    async fn install_group(&self, group: &GroupInstall) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstallerCall {
    InstallPath(PathInstall),
    DeletePath(PathDelete),
    InstallGroup(GroupInstall),
}

/// In-process installer: logs every instruction and keeps it for inspection.
/// Used when no switch controller is configured.
#[derive(Debug, Default)]
pub struct LoggingFlowInstaller {
    calls: Mutex<Vec<InstallerCall>>,
}

impl LoggingFlowInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<InstallerCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl FlowInstaller for LoggingFlowInstaller {
    async fn install_path(&self, install: &PathInstall) -> Result<()> {
        for hop in &install.hops {
            log::info!(
                "Install flow {} on {}: {} -> {} out port {} (priority {}, queue {}).",
                install.flow_id,
                hop.node,
                install.match_criteria.ipv4_src,
                install.match_criteria.ipv4_dst,
                hop.out_port,
                install.priority,
                install.queue_class.queue_id()
            );
        }
        self.calls.lock().await.push(InstallerCall::InstallPath(install.clone()));
        Ok(())
    }

    async fn delete_path(&self, delete: &PathDelete) -> Result<()> {
        for node in &delete.nodes {
            log::info!("Delete flow {} on {}: {} -> {}.", delete.flow_id, node, delete.match_criteria.ipv4_src, delete.match_criteria.ipv4_dst);
        }
        self.calls.lock().await.push(InstallerCall::DeletePath(delete.clone()));
        Ok(())
    }

    async fn install_group(&self, group: &GroupInstall) -> Result<()> {
        let ports: Vec<PortNo> = group.buckets.iter().map(|bucket| bucket.port).collect();
        log::info!("{:?} group {} on {} with output ports {:?}.", group.command, group.group_id, group.node, ports);
        self.calls.lock().await.push(InstallerCall::InstallGroup(group.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_class_threshold() {
        assert_eq!(QueueClass::from_priority(5, 8), QueueClass::RealTime);
        assert_eq!(QueueClass::from_priority(8, 8), QueueClass::BestEffort);
        assert_eq!(QueueClass::from_priority(10, 8).queue_id(), 0);
        assert_eq!(QueueClass::RealTime.queue_id(), 1);
    }

    #[tokio::test]
    async fn test_logging_installer_records_calls_in_order() {
        let installer = LoggingFlowInstaller::new();
        let match_criteria = MatchCriteria::ipv4(&EndpointId::new("10.0.0.1"), &EndpointId::new("10.0.0.11"));
        let flow_id = uuid::Uuid::new_v4();

        installer
            .install_path(&PathInstall {
                flow_id,
                hops: vec![HopOutput { node: NodeId::new("1"), out_port: 2 }],
                priority: 5,
                match_criteria: match_criteria.clone(),
                queue_class: QueueClass::RealTime,
            })
            .await
            .unwrap();
        installer.delete_path(&PathDelete { flow_id, nodes: vec![NodeId::new("1"), NodeId::new("3")], match_criteria }).await.unwrap();

        let calls = installer.calls().await;
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], InstallerCall::InstallPath(_)));
        assert!(matches!(&calls[1], InstallerCall::DeletePath(delete) if delete.nodes.len() == 2));
    }
}
