use thiserror::Error;

use crate::domain::utils::id::{EndpointId, NodeId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid controller configuration: {0}")]
    InvalidConfig(String),

    #[error("No path between {src} and {dst}")]
    NoPath { src: NodeId, dst: NodeId },

    #[error("Endpoint {0} is not attached to any known node")]
    EndpointUnresolved(EndpointId),

    #[error("Flow of publisher {publisher} would miss its deadline")]
    SchedulingViolation { publisher: EndpointId, node: Option<NodeId> },

    #[error("No admitted flow {publisher} -> {subscriber}")]
    UnknownFlow { publisher: EndpointId, subscriber: EndpointId },

    #[error("Flow installer dispatch failed: {0}")]
    InstallDispatch(String),

    #[error("Topology discovery failed: {0}")]
    TopologyUnavailable(String),

    #[error("Fixed-point iteration did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Admission controller is no longer running")]
    ControllerUnavailable,
}

pub type Result<T> = std::result::Result<T, Error>;
