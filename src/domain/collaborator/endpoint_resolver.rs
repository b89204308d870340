use std::collections::BTreeMap;

use crate::domain::utils::id::{EndpointId, NodeId};

/// Finds the switch an endpoint (publisher, subscriber or broker) is attached to.
pub trait EndpointResolver: Send + Sync {
    fn resolve(&self, endpoint: &EndpointId) -> Option<NodeId>;
}

/// Resolver backed by a fixed endpoint-to-switch table, usually taken from the
/// `endpoints` section of the configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticEndpointResolver {
    attachments: BTreeMap<EndpointId, NodeId>,
}

impl StaticEndpointResolver {
    pub fn new(attachments: BTreeMap<EndpointId, NodeId>) -> Self {
        Self { attachments }
    }

    pub fn attach(&mut self, endpoint: impl Into<String>, node: impl Into<String>) {
        self.attachments.insert(EndpointId::new(endpoint), NodeId::new(node));
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

impl EndpointResolver for StaticEndpointResolver {
    fn resolve(&self, endpoint: &EndpointId) -> Option<NodeId> {
        self.attachments.get(endpoint).cloned()
    }
}

impl<E: Into<String>, N: Into<String>> FromIterator<(E, N)> for StaticEndpointResolver {
    fn from_iter<I: IntoIterator<Item = (E, N)>>(iter: I) -> Self {
        let mut resolver = StaticEndpointResolver::default();
        for (endpoint, node) in iter {
            resolver.attach(endpoint, node);
        }
        resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_attached_endpoints_only() {
        let resolver: StaticEndpointResolver = [("10.0.0.1", "1"), ("10.0.0.11", "3")].into_iter().collect();

        assert_eq!(resolver.resolve(&EndpointId::new("10.0.0.11")), Some(NodeId::new("3")));
        assert_eq!(resolver.resolve(&EndpointId::new("10.0.0.99")), None);
        assert_eq!(resolver.len(), 2);
    }
}
