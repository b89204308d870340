use serde::Serialize;
use std::collections::BTreeSet;

use crate::domain::flow::rt_properties::RealTimeProperties;
use crate::domain::topology::path::Path;
use crate::domain::utils::id::{EndpointId, FlowId};

/// Whether the forwarding state of an admitted flow is known to be in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallState {
    /// Recorded, but no install dispatch has succeeded yet.
    Pending,
    Installed,
}

/// An admitted real-time flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEntry {
    pub id: FlowId,
    pub publisher: EndpointId,
    pub subscribers: BTreeSet<EndpointId>,
    pub properties: RealTimeProperties,
    pub path: Path,
    pub install_state: InstallState,
}

impl FlowEntry {
    pub fn new(publisher: EndpointId, subscribers: BTreeSet<EndpointId>, properties: RealTimeProperties, path: Path) -> Self {
        Self { id: uuid::Uuid::new_v4(), publisher, subscribers, properties, path, install_state: InstallState::Pending }
    }

    /// Two entries describe the same flow when publisher and subscriber set match.
    pub fn matches_flow_key(&self, publisher: &EndpointId, subscribers: &BTreeSet<EndpointId>) -> bool {
        &self.publisher == publisher && &self.subscribers == subscribers
    }

    pub fn is_installed(&self) -> bool {
        self.install_state == InstallState::Installed
    }
}
