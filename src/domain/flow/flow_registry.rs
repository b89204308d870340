use std::collections::BTreeSet;

use crate::domain::flow::flow_entry::{FlowEntry, InstallState};
use crate::domain::flow::rt_properties::RealTimeProperties;
use crate::domain::utils::id::{EndpointId, FlowId};

/// Table of admitted real-time flows, in admission order.
///
/// The registry has a single owner (the admission controller); concurrent
/// callers reach it only through the controller handle.
#[derive(Debug, Clone, Default)]
pub struct FlowRegistry {
    entries: Vec<FlowEntry>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact match on flow key and timing contract.
    pub fn exists(&self, publisher: &EndpointId, subscribers: &BTreeSet<EndpointId>, properties: &RealTimeProperties) -> bool {
        self.find(publisher, subscribers, properties).is_some()
    }

    pub fn find(&self, publisher: &EndpointId, subscribers: &BTreeSet<EndpointId>, properties: &RealTimeProperties) -> Option<&FlowEntry> {
        self.entries.iter().find(|entry| entry.matches_flow_key(publisher, subscribers) && &entry.properties == properties)
    }

    pub fn get(&self, id: FlowId) -> Option<&FlowEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Appends without any duplicate check; call [`FlowRegistry::exists`] first
    /// if that matters.
    pub fn add(&mut self, entry: FlowEntry) -> FlowId {
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    pub fn find_by_flow_key(&self, publisher: &EndpointId, subscribers: &BTreeSet<EndpointId>) -> Vec<&FlowEntry> {
        self.entries.iter().filter(|entry| entry.matches_flow_key(publisher, subscribers)).collect()
    }

    /// Removes every entry with this publisher and subscriber set and hands
    /// them back, so their forwarding state can be torn down.
    pub fn remove_by_flow_key(&mut self, publisher: &EndpointId, subscribers: &BTreeSet<EndpointId>) -> Vec<FlowEntry> {
        let (removed, kept): (Vec<FlowEntry>, Vec<FlowEntry>) =
            std::mem::take(&mut self.entries).into_iter().partition(|entry| entry.matches_flow_key(publisher, subscribers));
        self.entries = kept;
        removed
    }

    pub fn remove(&mut self, id: FlowId) -> Option<FlowEntry> {
        let position = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(position))
    }

    pub fn set_install_state(&mut self, id: FlowId, state: InstallState) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.install_state = state;
                true
            }
            None => false,
        }
    }

    pub fn pending_installs(&self) -> Vec<FlowId> {
        self.entries.iter().filter(|entry| entry.install_state == InstallState::Pending).map(|entry| entry.id).collect()
    }

    pub fn all(&self) -> &[FlowEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
