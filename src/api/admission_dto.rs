use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::admission::outcome::{AdmissionOutcome, AdmissionStatus, RemovalOutcome, RemovalStatus};
use crate::domain::admission::request::{AdmissionRequest, MulticastJoin, RemovalRequest};
use crate::domain::analysis::schedule_analyzer::Violation;
use crate::domain::flow::flow_entry::{FlowEntry, InstallState};
use crate::domain::flow::rt_properties::RealTimeProperties;
use crate::domain::topology::path::Path;
use crate::domain::utils::id::{EndpointId, FlowId, NodeId};
use crate::error::{Error, Result};

/// Body of `POST /rt_mqtt/register`.
///
/// For a multicast join `src` is the subscriber and `dst` the broker, and the
/// timing fields may be left out.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationDto {
    pub src: String,
    pub dst: String,
    #[serde(rename = "Ci")]
    pub ci: Option<f64>,
    #[serde(rename = "Pi")]
    pub pi: Option<i64>,
    #[serde(rename = "Ti")]
    pub ti: Option<f64>,
    #[serde(rename = "Di")]
    pub di: Option<f64>,
    #[serde(rename = "BWi")]
    pub bwi: Option<f64>,
    #[serde(rename = "Ji")]
    pub ji: Option<f64>,
    #[serde(default)]
    pub is_multicast: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Admission(AdmissionRequest),
    MulticastJoin(MulticastJoin),
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| Error::InvalidRequest(format!("missing field {}", field)))
}

impl TryFrom<RegistrationDto> for Registration {
    type Error = Error;

    fn try_from(dto: RegistrationDto) -> Result<Self> {
        if dto.src.trim().is_empty() || dto.dst.trim().is_empty() {
            return Err(Error::InvalidRequest("src and dst must not be empty".to_string()));
        }

        if dto.is_multicast {
            return Ok(Registration::MulticastJoin(MulticastJoin::new(dto.src, dto.dst)));
        }

        let properties = RealTimeProperties::new(required(dto.ci, "Ci")?, required(dto.ti, "Ti")?, required(dto.di, "Di")?, required(dto.pi, "Pi")?)
            .with_jitter(dto.ji.unwrap_or(0.0))
            .with_bandwidth(dto.bwi.unwrap_or(0.0));

        let request = AdmissionRequest::new(dto.src, dto.dst, properties);
        request.validate()?;

        Ok(Registration::Admission(request))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponseDto {
    pub status: AdmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,
    /// Next hops per switch of a multicast tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<BTreeMap<NodeId, Vec<NodeId>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unreachable: Option<Vec<NodeId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<FlowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_to_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
}

impl From<AdmissionOutcome> for AdmissionResponseDto {
    fn from(outcome: AdmissionOutcome) -> Self {
        let (tree, unreachable) = match outcome.tree {
            Some(tree) => (Some(tree.next_hops), Some(tree.unreachable).filter(|nodes| !nodes.is_empty())),
            None => (None, None),
        };

        AdmissionResponseDto {
            status: outcome.status,
            path: outcome.path,
            tree,
            unreachable,
            flow_id: outcome.flow_id,
            end_to_end: outcome.end_to_end,
            violation: outcome.violation,
        }
    }
}

/// Body of `POST /rt_mqtt/remove`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemovalDto {
    pub src: String,
    pub dst: String,
}

impl From<RemovalDto> for RemovalRequest {
    fn from(dto: RemovalDto) -> Self {
        RemovalRequest::new(dto.src, dto.dst)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RemovalResponseDto {
    pub status: RemovalStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<FlowId>,
}

impl From<RemovalOutcome> for RemovalResponseDto {
    fn from(outcome: RemovalOutcome) -> Self {
        RemovalResponseDto { status: outcome.status, removed: outcome.removed }
    }
}

/// One admitted flow as listed by `GET /rt_mqtt/flows`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDto {
    pub id: FlowId,
    pub publisher: EndpointId,
    pub subscribers: BTreeSet<EndpointId>,
    pub properties: RealTimeProperties,
    pub path: Path,
    pub install_state: InstallState,
}

impl From<FlowEntry> for FlowDto {
    fn from(entry: FlowEntry) -> Self {
        FlowDto {
            id: entry.id,
            publisher: entry.publisher,
            subscribers: entry.subscribers,
            properties: entry.properties,
            path: entry.path,
            install_state: entry.install_state,
        }
    }
}
