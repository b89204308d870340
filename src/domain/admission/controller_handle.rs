use tokio::sync::{mpsc, oneshot};

use crate::domain::admission::admission_controller::AdmissionController;
use crate::domain::admission::controller_message::ControllerMessage;
use crate::domain::admission::outcome::{AdmissionOutcome, RemovalOutcome};
use crate::domain::admission::request::{AdmissionRequest, MulticastJoin, RemovalRequest};
use crate::domain::flow::flow_entry::FlowEntry;
use crate::domain::topology::routing_engine::BucketWeight;
use crate::domain::utils::id::{FlowId, NodeId};
use crate::error::{Error, Result};

const MAILBOX_CAPACITY: usize = 64;

/// Cloneable handle to the task that owns the [`AdmissionController`].
///
/// Requests from any number of callers are queued and processed one after the
/// other, so no two admissions ever interleave.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerMessage>,
}

impl ControllerHandle {
    /// Moves `controller` into its own task. Must be called inside a tokio runtime.
    pub fn spawn(controller: AdmissionController) -> Self {
        let (tx, rx) = mpsc::channel::<ControllerMessage>(MAILBOX_CAPACITY);

        tokio::spawn(async move {
            log::info!("Admission controller task started.");
            Self::run_controller_loop(controller, rx).await;
            log::info!("Admission controller task stopped.");
        });

        ControllerHandle { tx }
    }

    async fn run_controller_loop(mut controller: AdmissionController, mut rx: mpsc::Receiver<ControllerMessage>) {
        while let Some(msg) = rx.recv().await {
            match msg {
                ControllerMessage::Admit { request, reply_to } => {
                    let _ = reply_to.send(controller.admit(&request).await);
                }
                ControllerMessage::JoinMulticast { join, reply_to } => {
                    let _ = reply_to.send(controller.join_multicast(&join).await);
                }
                ControllerMessage::Remove { request, reply_to } => {
                    let _ = reply_to.send(controller.remove(&request).await);
                }
                ControllerMessage::RetryPendingInstalls(reply) => {
                    let _ = reply.send(controller.retry_pending_installs().await);
                }
                ControllerMessage::GetFlows(reply) => {
                    let _ = reply.send(controller.flows());
                }
                ControllerMessage::GetPaths { src, dst, reply_to } => {
                    let _ = reply_to.send(controller.paths(&src, &dst).await);
                }
                ControllerMessage::Shutdown => break,
            }
        }
    }

    async fn call<R, F>(&self, msg_builder: F) -> Result<R>
    where
        F: FnOnce(oneshot::Sender<R>) -> ControllerMessage,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx.send(msg_builder(reply_tx)).await.map_err(|_| Error::ControllerUnavailable)?;
        reply_rx.await.map_err(|_| Error::ControllerUnavailable)
    }

    pub async fn admit(&self, request: AdmissionRequest) -> Result<AdmissionOutcome> {
        self.call(|reply_to| ControllerMessage::Admit { request, reply_to }).await
    }

    pub async fn join_multicast(&self, join: MulticastJoin) -> Result<AdmissionOutcome> {
        self.call(|reply_to| ControllerMessage::JoinMulticast { join, reply_to }).await
    }

    pub async fn remove(&self, request: RemovalRequest) -> Result<RemovalOutcome> {
        self.call(|reply_to| ControllerMessage::Remove { request, reply_to }).await
    }

    pub async fn retry_pending_installs(&self) -> Result<Vec<FlowId>> {
        self.call(ControllerMessage::RetryPendingInstalls).await
    }

    pub async fn flows(&self) -> Result<Vec<FlowEntry>> {
        self.call(ControllerMessage::GetFlows).await
    }

    pub async fn paths(&self, src: NodeId, dst: NodeId) -> Result<Vec<BucketWeight>> {
        self.call(|reply_to| ControllerMessage::GetPaths { src, dst, reply_to }).await?
    }

    /// Stops the controller task after the messages queued before this one.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(ControllerMessage::Shutdown).await.map_err(|_| Error::ControllerUnavailable)
    }
}
