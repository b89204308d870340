use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::topology::topology_graph::{DEFAULT_LINK_WEIGHT, LinkDescriptor, TopologySnapshot};
use crate::domain::utils::id::{NodeId, PortNo};
use crate::error::{Error, Result};

/// Live view of the switches and links, queried before every admission.
#[async_trait]
pub trait TopologySource: Send + Sync {
    async fn fetch(&self) -> Result<TopologySnapshot>;
}

/// Topology held in memory. Starts from the configuration and can be replaced
/// at runtime, e.g. when links go down.
#[derive(Debug, Clone, Default)]
pub struct StaticTopologySource {
    snapshot: Arc<RwLock<TopologySnapshot>>,
}

impl StaticTopologySource {
    pub fn new(snapshot: TopologySnapshot) -> Self {
        Self { snapshot: Arc::new(RwLock::new(snapshot)) }
    }

    pub async fn replace(&self, snapshot: TopologySnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// Drops every link between `src` and `dst`, in both directions.
    pub async fn remove_link(&self, src: &NodeId, dst: &NodeId) {
        let mut snapshot = self.snapshot.write().await;
        snapshot.links.retain(|link| !((&link.src == src && &link.dst == dst) || (&link.src == dst && &link.dst == src)));
    }
}

#[async_trait]
impl TopologySource for StaticTopologySource {
    async fn fetch(&self) -> Result<TopologySnapshot> {
        Ok(self.snapshot.read().await.clone())
    }
}

#[derive(Debug, Deserialize)]
struct RestSwitch {
    dpid: String,
}

#[derive(Debug, Deserialize)]
struct RestPort {
    dpid: String,
    port_no: String,
}

#[derive(Debug, Deserialize)]
struct RestLink {
    src: RestPort,
    dst: RestPort,
}

/// Topology discovered by an OpenFlow controller and read from its REST
/// topology interface. Datapath ids and port numbers arrive hex encoded.
#[derive(Debug, Clone)]
pub struct RestTopologySource {
    client: reqwest::Client,
    base_url: String,
}

impl RestTopologySource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self { client: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_string() }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::TopologyUnavailable(format!("{} answered {}", url, status)));
        }

        Ok(response.json().await?)
    }
}

fn parse_hex(field: &str, value: &str) -> Result<u64> {
    u64::from_str_radix(value, 16).map_err(|_| Error::TopologyUnavailable(format!("{} '{}' is not hex encoded", field, value)))
}

fn to_snapshot(switches: Vec<RestSwitch>, links: Vec<RestLink>) -> Result<TopologySnapshot> {
    let mut snapshot = TopologySnapshot::default();

    for switch in switches {
        snapshot.nodes.push(NodeId::new(parse_hex("dpid", &switch.dpid)?.to_string()));
    }

    for link in links {
        let port = parse_hex("port_no", &link.src.port_no)?;
        let port = PortNo::try_from(port).map_err(|_| Error::TopologyUnavailable(format!("port {} out of range", port)))?;

        snapshot.links.push(LinkDescriptor::new(
            parse_hex("dpid", &link.src.dpid)?.to_string(),
            parse_hex("dpid", &link.dst.dpid)?.to_string(),
            DEFAULT_LINK_WEIGHT,
            port,
        ));
    }

    Ok(snapshot)
}

#[async_trait]
impl TopologySource for RestTopologySource {
    async fn fetch(&self) -> Result<TopologySnapshot> {
        let switches: Vec<RestSwitch> = self.get("/v1.0/topology/switches").await?;
        let links: Vec<RestLink> = self.get("/v1.0/topology/links").await?;

        to_snapshot(switches, links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_reflects_replacements() {
        let source = StaticTopologySource::new(TopologySnapshot {
            nodes: Vec::new(),
            links: vec![LinkDescriptor::new("1", "2", 1.0, 2), LinkDescriptor::new("2", "1", 1.0, 1), LinkDescriptor::new("2", "3", 1.0, 3)],
        });

        source.remove_link(&NodeId::new("1"), &NodeId::new("2")).await;

        let snapshot = source.fetch().await.unwrap();
        assert_eq!(snapshot.links, vec![LinkDescriptor::new("2", "3", 1.0, 3)]);
    }

    #[test]
    fn test_rest_documents_are_decoded() {
        let switches: Vec<RestSwitch> = serde_json::from_str(r#"[{"dpid": "0000000000000001"}, {"dpid": "000000000000000a"}]"#).unwrap();
        let links: Vec<RestLink> = serde_json::from_str(
            r#"[{"src": {"dpid": "0000000000000001", "port_no": "00000002", "name": "s1-eth2"},
                 "dst": {"dpid": "000000000000000a", "port_no": "00000001", "name": "s10-eth1"}}]"#,
        )
        .unwrap();

        let snapshot = to_snapshot(switches, links).unwrap();

        assert_eq!(snapshot.nodes, vec![NodeId::new("1"), NodeId::new("10")]);
        assert_eq!(snapshot.links, vec![LinkDescriptor::new("1", "10", DEFAULT_LINK_WEIGHT, 2)]);
    }
}
