use tokio::sync::oneshot;

use crate::domain::admission::outcome::{AdmissionOutcome, RemovalOutcome};
use crate::domain::admission::request::{AdmissionRequest, MulticastJoin, RemovalRequest};
use crate::domain::flow::flow_entry::FlowEntry;
use crate::domain::topology::routing_engine::BucketWeight;
use crate::domain::utils::id::{FlowId, NodeId};
use crate::error::Result;

/// One message per operation of the admission controller. The controller task
/// handles them strictly in arrival order.
#[derive(Debug)]
pub enum ControllerMessage {
    Admit {
        request: AdmissionRequest,
        reply_to: oneshot::Sender<AdmissionOutcome>,
    },

    JoinMulticast {
        join: MulticastJoin,
        reply_to: oneshot::Sender<AdmissionOutcome>,
    },

    Remove {
        request: RemovalRequest,
        reply_to: oneshot::Sender<RemovalOutcome>,
    },

    RetryPendingInstalls(oneshot::Sender<Vec<FlowId>>),

    GetFlows(oneshot::Sender<Vec<FlowEntry>>),

    GetPaths {
        src: NodeId,
        dst: NodeId,
        reply_to: oneshot::Sender<Result<Vec<BucketWeight>>>,
    },

    Shutdown,
}
