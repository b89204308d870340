use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which end of the `Pi` scale is served first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriorityOrder {
    /// A numerically larger `Pi` has precedence.
    #[default]
    HigherValueFirst,
    /// A numerically smaller `Pi` has precedence.
    LowerValueFirst,
}

impl PriorityOrder {
    /// Returns true if a flow with priority `pi` strictly preempts one with priority `than`.
    pub fn is_higher(&self, pi: i64, than: i64) -> bool {
        match self {
            PriorityOrder::HigherValueFirst => pi > than,
            PriorityOrder::LowerValueFirst => pi < than,
        }
    }
}

/// Deployment-dependent constants of the schedulability analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Propagation delay added per traversed link, in seconds.
    pub link_delay_per_hop: f64,

    /// Two successive iterates closer than this are considered converged.
    pub convergence_tolerance: f64,

    /// Upper bound on fixed-point iterations before giving up.
    pub max_iterations: usize,

    /// The busy period may grow to this multiple of `Di` before it is
    /// declared non-convergent.
    pub busy_period_cutoff_factor: f64,

    pub priority_order: PriorityOrder,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            link_delay_per_hop: 0.0001,
            convergence_tolerance: 1e-9,
            max_iterations: 10_000,
            busy_period_cutoff_factor: 10.0,
            priority_order: PriorityOrder::HigherValueFirst,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.link_delay_per_hop.is_finite() || self.link_delay_per_hop < 0.0 {
            return Err(Error::InvalidConfig(format!("linkDelayPerHop must be a non-negative number, got {}", self.link_delay_per_hop)));
        }
        if !(self.convergence_tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!("convergenceTolerance must be positive, got {}", self.convergence_tolerance)));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("maxIterations must be at least 1".to_string()));
        }
        if !(self.busy_period_cutoff_factor >= 1.0) {
            return Err(Error::InvalidConfig(format!("busyPeriodCutoffFactor must be at least 1, got {}", self.busy_period_cutoff_factor)));
        }
        Ok(())
    }
}
