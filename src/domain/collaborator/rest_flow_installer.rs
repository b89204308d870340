use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::collaborator::flow_installer::{FlowInstaller, GroupCommand, GroupInstall, MatchCriteria, PathDelete, PathInstall};
use crate::domain::utils::id::{NodeId, PortNo};
use crate::error::{Error, Result};

const FLOW_ADD: &str = "/stats/flowentry/add";
const FLOW_DELETE: &str = "/stats/flowentry/delete";
const GROUP_ADD: &str = "/stats/groupentry/add";
const GROUP_MODIFY: &str = "/stats/groupentry/modify";

/// Installer talking to the REST interface of an OpenFlow controller
/// (`ofctl_rest` style documents, one request per switch).
#[derive(Debug, Clone)]
pub struct RestFlowInstaller {
    client: reqwest::Client,
    base_url: String,
}

impl RestFlowInstaller {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self { client: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_string() }
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<()> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        let body_text = response.text().await.unwrap_or_default();
        Err(Error::InstallDispatch(format!("{} answered {}: {}", url, status, body_text)))
    }
}

/// Datapath ids travel as integers on this interface.
fn dpid(node: &NodeId) -> Result<u64> {
    node.as_str().parse::<u64>().map_err(|_| Error::InstallDispatch(format!("node {} is not a numeric datapath id", node)))
}

fn match_body(match_criteria: &MatchCriteria) -> Value {
    json!({
        "eth_type": match_criteria.eth_type,
        "ipv4_src": match_criteria.ipv4_src.as_str(),
        "ipv4_dst": match_criteria.ipv4_dst.as_str(),
    })
}

fn path_hop_body(node: &NodeId, out_port: PortNo, install: &PathInstall) -> Result<Value> {
    Ok(json!({
        "dpid": dpid(node)?,
        "priority": install.priority,
        "match": match_body(&install.match_criteria),
        "actions": [
            { "type": "SET_QUEUE", "queue_id": install.queue_class.queue_id() },
            { "type": "OUTPUT", "port": out_port },
        ],
    }))
}

fn delete_body(node: &NodeId, match_criteria: &MatchCriteria) -> Result<Value> {
    Ok(json!({ "dpid": dpid(node)?, "match": match_body(match_criteria) }))
}

fn group_body(group: &GroupInstall) -> Result<Value> {
    let buckets: Vec<Value> = group.buckets.iter().map(|bucket| json!({ "actions": [{ "type": "OUTPUT", "port": bucket.port }] })).collect();

    Ok(json!({
        "dpid": dpid(&group.node)?,
        "type": "ALL",
        "group_id": group.group_id,
        "buckets": buckets,
    }))
}

fn group_flow_body(group: &GroupInstall) -> Result<Value> {
    Ok(json!({
        "dpid": dpid(&group.node)?,
        "priority": group.priority,
        "match": match_body(&group.match_criteria),
        "actions": [{ "type": "GROUP", "group_id": group.group_id }],
    }))
}

#[async_trait]
impl FlowInstaller for RestFlowInstaller {
    async fn install_path(&self, install: &PathInstall) -> Result<()> {
        for hop in &install.hops {
            self.post(FLOW_ADD, &path_hop_body(&hop.node, hop.out_port, install)?).await?;
        }
        Ok(())
    }

    async fn delete_path(&self, delete: &PathDelete) -> Result<()> {
        for node in &delete.nodes {
            self.post(FLOW_DELETE, &delete_body(node, &delete.match_criteria)?).await?;
        }
        Ok(())
    }

    async fn install_group(&self, group: &GroupInstall) -> Result<()> {
        let endpoint = match group.command {
            GroupCommand::Add => GROUP_ADD,
            GroupCommand::Modify => GROUP_MODIFY,
        };
        self.post(endpoint, &group_body(group)?).await?;
        self.post(FLOW_ADD, &group_flow_body(group)?).await
    }
}
