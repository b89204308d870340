use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::collaborator::flow_installer::GroupCommand;
use crate::domain::utils::id::{EndpointId, GroupId, NodeId};

const FIRST_GROUP_ID: GroupId = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MulticastGroup {
    pub group_id: GroupId,
    pub broker: EndpointId,
    /// In join order, without duplicates.
    pub subscribers: Vec<EndpointId>,
    /// Nodes that already carry this group.
    pub installed_on: BTreeSet<NodeId>,
}

/// Subscribers per broker. Every broker gets its own group id.
#[derive(Debug, Clone)]
pub struct MulticastGroups {
    groups: BTreeMap<EndpointId, MulticastGroup>,
    next_group_id: GroupId,
}

impl Default for MulticastGroups {
    fn default() -> Self {
        Self { groups: BTreeMap::new(), next_group_id: FIRST_GROUP_ID }
    }
}

impl MulticastGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `subscriber` to the group of `broker`, creating the group on first use.
    pub fn join(&mut self, broker: &EndpointId, subscriber: &EndpointId) -> &MulticastGroup {
        let next_group_id = &mut self.next_group_id;
        let group = self.groups.entry(broker.clone()).or_insert_with(|| {
            let group_id = *next_group_id;
            *next_group_id += 1;
            log::info!("Created multicast group {} for broker {}.", group_id, broker);
            MulticastGroup { group_id, broker: broker.clone(), subscribers: Vec::new(), installed_on: BTreeSet::new() }
        });

        if !group.subscribers.contains(subscriber) {
            group.subscribers.push(subscriber.clone());
        }

        group
    }

    pub fn get(&self, broker: &EndpointId) -> Option<&MulticastGroup> {
        self.groups.get(broker)
    }

    pub fn command_for(&self, broker: &EndpointId, node: &NodeId) -> GroupCommand {
        match self.groups.get(broker) {
            Some(group) if group.installed_on.contains(node) => GroupCommand::Modify,
            _ => GroupCommand::Add,
        }
    }

    pub fn mark_installed(&mut self, broker: &EndpointId, node: &NodeId) {
        if let Some(group) = self.groups.get_mut(broker) {
            group.installed_on.insert(node.clone());
        }
    }

    /// Nodes carrying the group of `broker` that `tree_nodes` no longer covers.
    pub fn stale_nodes<'a>(&self, broker: &EndpointId, tree_nodes: impl IntoIterator<Item = &'a NodeId>) -> Vec<NodeId> {
        let Some(group) = self.groups.get(broker) else {
            return Vec::new();
        };

        let tree_nodes: BTreeSet<&NodeId> = tree_nodes.into_iter().collect();
        group.installed_on.iter().filter(|node| !tree_nodes.contains(node)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
