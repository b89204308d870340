use crate::domain::flow::rt_properties::RealTimeProperties;
use crate::domain::utils::id::EndpointId;
use crate::error::Result;

/// Point-to-point admission: publisher `src` sends to subscriber `dst` under
/// the given timing contract.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionRequest {
    pub src: EndpointId,
    pub dst: EndpointId,
    pub properties: RealTimeProperties,
}

impl AdmissionRequest {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, properties: RealTimeProperties) -> Self {
        Self { src: EndpointId::new(src), dst: EndpointId::new(dst), properties }
    }

    pub fn validate(&self) -> Result<()> {
        self.properties.validate()
    }
}

/// A subscriber joining the multicast group of a broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastJoin {
    pub subscriber: EndpointId,
    pub broker: EndpointId,
}

impl MulticastJoin {
    pub fn new(subscriber: impl Into<String>, broker: impl Into<String>) -> Self {
        Self { subscriber: EndpointId::new(subscriber), broker: EndpointId::new(broker) }
    }
}

/// Removal of every admitted flow from `src` to exactly the subscriber `dst`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRequest {
    pub src: EndpointId,
    pub dst: EndpointId,
}

impl RemovalRequest {
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self { src: EndpointId::new(src), dst: EndpointId::new(dst) }
    }
}
