use serde::Serialize;

use crate::domain::analysis::schedule_analyzer::Violation;
use crate::domain::topology::multicast_tree::MulticastTree;
use crate::domain::topology::path::Path;
use crate::domain::utils::id::FlowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionStatus {
    /// Same publisher and contract already admitted; nothing was re-routed.
    Exists,
    /// No path between the endpoints.
    Rejected,
    RejectedScheduling,
    Accepted,
    Joined,
    /// Admitted and recorded, but the forwarding state could not be installed.
    InstallFailed,
    TopologyUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemovalStatus {
    NotFound,
    Deleted,
    /// Forwarding state could not be deleted; the flow stays registered.
    UninstallFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionOutcome {
    pub status: AdmissionStatus,
    pub path: Option<Path>,
    pub tree: Option<MulticastTree>,
    pub flow_id: Option<FlowId>,
    pub end_to_end: Option<f64>,
    pub violation: Option<Violation>,
}

impl AdmissionOutcome {
    pub fn with_status(status: AdmissionStatus) -> Self {
        Self { status, path: None, tree: None, flow_id: None, end_to_end: None, violation: None }
    }

    pub fn rejected_scheduling(violation: Violation) -> Self {
        Self { violation: Some(violation), ..Self::with_status(AdmissionStatus::RejectedScheduling) }
    }

    pub fn admitted(status: AdmissionStatus, flow_id: FlowId, path: Path, end_to_end: f64) -> Self {
        Self { path: Some(path), flow_id: Some(flow_id), end_to_end: Some(end_to_end), ..Self::with_status(status) }
    }

    pub fn joined(status: AdmissionStatus, tree: MulticastTree) -> Self {
        Self { tree: Some(tree), ..Self::with_status(status) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemovalOutcome {
    pub status: RemovalStatus,
    pub removed: Vec<FlowId>,
}
