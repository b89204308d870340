use serde::Serialize;

use crate::domain::analysis::analysis_config::AnalysisConfig;
use crate::domain::analysis::busy_period;
use crate::domain::analysis::trajectory::{link_delays, trajectory_delay};
use crate::domain::flow::flow_entry::FlowEntry;
use crate::domain::flow::flow_registry::FlowRegistry;
use crate::domain::flow::rt_properties::RealTimeProperties;
use crate::domain::topology::path::Path;
use crate::domain::utils::id::{EndpointId, NodeId};
use crate::error::Result;

/// A flow as the analyzer sees it. Registered flows and the candidate under
/// admission take the same shape.
#[derive(Debug, Clone, Copy)]
pub struct FlowUnderAnalysis<'a> {
    pub publisher: &'a EndpointId,
    pub properties: &'a RealTimeProperties,
    pub path: &'a Path,
}

impl<'a> FlowUnderAnalysis<'a> {
    pub fn new(publisher: &'a EndpointId, properties: &'a RealTimeProperties, path: &'a Path) -> Self {
        Self { publisher, properties, path }
    }
}

impl<'a> From<&'a FlowEntry> for FlowUnderAnalysis<'a> {
    fn from(entry: &'a FlowEntry) -> Self {
        FlowUnderAnalysis { publisher: &entry.publisher, properties: &entry.properties, path: &entry.path }
    }
}

/// Outcome of the response-time recurrence at one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeResponse {
    Converged(f64),
    /// The iterate passed the flow's deadline; iteration stopped there.
    DeadlineExceeded(f64),
    NonConvergent { iterations: usize },
}

impl NodeResponse {
    /// Upper bound usable in sums: infinite unless the recurrence converged.
    pub fn bound(&self) -> f64 {
        match self {
            NodeResponse::Converged(response_time) => *response_time,
            _ => f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViolationReason {
    #[serde(rename_all = "camelCase")]
    DeadlineMiss { end_to_end: f64, deadline: f64 },
    #[serde(rename_all = "camelCase")]
    NodeDeadlineExceeded { response_time: f64, deadline: f64 },
    NonConvergent { iterations: usize },
    EmptyPath,
}

/// Which flow would miss its deadline, and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub publisher: EndpointId,
    pub node: Option<NodeId>,
    pub reason: ViolationReason,
    /// Set when the failing flow is the candidate itself rather than an
    /// already admitted one.
    pub is_candidate: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Everything stays within its deadline; carries the candidate's end-to-end delay.
    Schedulable { end_to_end: f64 },
    Violation(Violation),
}

impl Verdict {
    pub fn is_schedulable(&self) -> bool {
        matches!(self, Verdict::Schedulable { .. })
    }
}

/// Holistic response-time analysis over every node a flow traverses.
///
/// Pure: reads the registry, never changes it.
#[derive(Debug, Clone, Default)]
pub struct ScheduleAnalyzer {
    config: AnalysisConfig,
}

impl ScheduleAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Worst-case response time of `flows[target]` at `node`.
    ///
    /// Interference comes from every other flow crossing `node` with strictly
    /// higher priority:
    /// `R₀ = Cᵢ`, `Rₖ₊₁ = Cᵢ + Σ_{j ∈ HP(n)} ceil(Rₖ / Tⱼ) · Cⱼ`.
    pub fn node_response_time(&self, node: &NodeId, target: usize, flows: &[FlowUnderAnalysis<'_>]) -> NodeResponse {
        let own = flows[target].properties;
        let order = self.config.priority_order;

        let higher_priority: Vec<&RealTimeProperties> = flows
            .iter()
            .enumerate()
            .filter(|(index, flow)| *index != target && flow.path.contains(node))
            .map(|(_, flow)| flow.properties)
            .filter(|properties| properties.ti > 0.0 && order.is_higher(properties.pi, own.pi))
            .collect();

        let mut current = own.ci;
        for _ in 0..self.config.max_iterations {
            let interference: f64 = higher_priority.iter().map(|hp| (current / hp.ti).ceil() * hp.ci).sum();
            let next = own.ci + interference;

            if next > own.di {
                return NodeResponse::DeadlineExceeded(next);
            }
            if (next - current).abs() < self.config.convergence_tolerance {
                return NodeResponse::Converged(next);
            }

            current = next;
        }

        NodeResponse::NonConvergent { iterations: self.config.max_iterations }
    }

    /// Sum of the node response times along the path of `flows[target]` plus
    /// the per-hop link delay.
    pub fn end_to_end_delay(&self, target: usize, flows: &[FlowUnderAnalysis<'_>]) -> std::result::Result<f64, Violation> {
        let flow = flows[target];
        let violation = |node: Option<&NodeId>, reason: ViolationReason| Violation {
            publisher: flow.publisher.clone(),
            node: node.cloned(),
            reason,
            is_candidate: false,
        };

        if flow.path.is_empty() {
            return Err(violation(None, ViolationReason::EmptyPath));
        }

        let mut switch_delays = Vec::with_capacity(flow.path.len());
        for node in flow.path.nodes() {
            match self.node_response_time(node, target, flows) {
                NodeResponse::Converged(response_time) => switch_delays.push(response_time),
                NodeResponse::DeadlineExceeded(response_time) => {
                    let reason = ViolationReason::NodeDeadlineExceeded { response_time, deadline: flow.properties.di };
                    return Err(violation(Some(node), reason));
                }
                NodeResponse::NonConvergent { iterations } => {
                    return Err(violation(Some(node), ViolationReason::NonConvergent { iterations }));
                }
            }
        }

        let end_to_end = trajectory_delay(&link_delays(flow.path, self.config.link_delay_per_hop), &switch_delays);
        if end_to_end > flow.properties.di {
            return Err(violation(None, ViolationReason::DeadlineMiss { end_to_end, deadline: flow.properties.di }));
        }

        Ok(end_to_end)
    }

    /// End-to-end delays of every flow in `flows`, or the first violation.
    pub fn analyze_flow_set(&self, flows: &[FlowUnderAnalysis<'_>]) -> std::result::Result<Vec<f64>, Violation> {
        (0..flows.len()).map(|target| self.end_to_end_delay(target, flows)).collect()
    }

    /// Checks whether every registered flow and the candidate stay within their
    /// deadlines once the candidate is added.
    ///
    /// Admitting a flow can push already admitted lower-priority flows past their
    /// deadlines, so the whole set is re-evaluated.
    pub fn analyze(&self, candidate: FlowUnderAnalysis<'_>, registry: &FlowRegistry) -> Verdict {
        let mut flows: Vec<FlowUnderAnalysis<'_>> = registry.all().iter().map(FlowUnderAnalysis::from).collect();
        flows.push(candidate);
        let candidate_index = flows.len() - 1;

        let mut candidate_delay = 0.0;
        for target in 0..flows.len() {
            match self.end_to_end_delay(target, &flows) {
                Ok(end_to_end) if target == candidate_index => candidate_delay = end_to_end,
                Ok(_) => {}
                Err(mut violation) => {
                    violation.is_candidate = target == candidate_index;
                    return Verdict::Violation(violation);
                }
            }
        }

        Verdict::Schedulable { end_to_end: candidate_delay }
    }

    pub fn is_schedulable(&self, candidate: FlowUnderAnalysis<'_>, registry: &FlowRegistry) -> bool {
        self.analyze(candidate, registry).is_schedulable()
    }

    /// Isolated response time of `flow` against `interfering`, using the
    /// busy-period analysis.
    pub fn point_response_time(&self, flow: &RealTimeProperties, interfering: &[RealTimeProperties]) -> Result<f64> {
        busy_period::holistic_response_time(flow, interfering, &self.config)
    }

    pub fn is_point_schedulable(&self, flow: &RealTimeProperties, interfering: &[RealTimeProperties]) -> bool {
        busy_period::is_point_schedulable(flow, interfering, &self.config)
    }
}
