use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::collaborator::flow_installer::QueueClass;
use crate::domain::collaborator::retry::RetryPolicy;
use crate::domain::utils::id::EndpointId;
use crate::error::{Error, Result};

/// How admitted flows are turned into forwarding instructions, and how hard
/// the controller tries to get them onto the switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchConfig {
    /// Flows with `Pi` below this value go to the real-time queue.
    pub rt_queue_threshold: i64,
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
    pub retry_backoff_ms: u64,
    /// Destination address matched by multicast group flows.
    pub multicast_group_address: EndpointId,
    pub group_flow_priority: i64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            rt_queue_threshold: 8,
            max_attempts: 3,
            attempt_timeout_ms: 1000,
            retry_backoff_ms: 50,
            multicast_group_address: EndpointId::new("224.0.0.1"),
            group_flow_priority: 10,
        }
    }
}

impl DispatchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.attempt_timeout_ms), Duration::from_millis(self.retry_backoff_ms))
    }

    pub fn queue_class(&self, pi: i64) -> QueueClass {
        QueueClass::from_priority(pi, self.rt_queue_threshold)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("dispatch.maxAttempts must be at least 1".to_string()));
        }
        if self.attempt_timeout_ms == 0 {
            return Err(Error::InvalidConfig("dispatch.attemptTimeoutMs must be positive".to_string()));
        }
        Ok(())
    }
}
