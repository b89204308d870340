use crate::domain::analysis::analysis_config::AnalysisConfig;
use crate::domain::flow::rt_properties::RealTimeProperties;
use crate::error::{Error, Result};

/// Interference of `interfering` flows within a window of length `window`:
/// `Σ ceil((window + Jj) / Tj) · Cj`.
fn jittered_interference(window: f64, interfering: &[RealTimeProperties]) -> f64 {
    interfering.iter().filter(|flow| flow.ti > 0.0).map(|flow| ((window + flow.ji) / flow.ti).ceil() * flow.ci).sum()
}

/// Solves `x = base + interference(x)` starting at `base`.
///
/// Fails with [`Error::NonConvergence`] once `x` grows past `cutoff` or the
/// iteration budget is spent.
fn solve_fixed_point(base: f64, interfering: &[RealTimeProperties], cutoff: f64, config: &AnalysisConfig) -> Result<f64> {
    let mut current = base;

    for _ in 0..config.max_iterations {
        let next = base + jittered_interference(current, interfering);

        if (next - current).abs() < config.convergence_tolerance {
            return Ok(next);
        }
        if next > cutoff {
            return Err(Error::NonConvergence { iterations: config.max_iterations });
        }

        current = next;
    }

    Err(Error::NonConvergence { iterations: config.max_iterations })
}

/// Longest interval the link stays busy with `flow` and everything interfering with it.
///
/// `w₀ = Cᵢ`, `wₖ₊₁ = Cᵢ + Σⱼ ceil((wₖ + Jⱼ) / Tⱼ) · Cⱼ`, abandoned beyond
/// `busy_period_cutoff_factor × Dᵢ`.
pub fn busy_period(flow: &RealTimeProperties, interfering: &[RealTimeProperties], config: &AnalysisConfig) -> Result<f64> {
    let cutoff = config.busy_period_cutoff_factor * flow.di;
    solve_fixed_point(flow.ci, interfering, cutoff, config)
}

/// Worst-case response time of `flow` at a single contention point.
///
/// Every instance `q` released within the busy period is examined: its
/// queuing delay `v` solves `v = q·Cᵢ + Σⱼ ceil((v + Jⱼ) / Tⱼ) · Cⱼ` and its
/// response time is `v + Cᵢ − q·Tᵢ`. The result is the largest one.
/// This is the analysis for isolated, non path-based checks; admission
/// uses the per-node analysis of the analyzer instead.
pub fn holistic_response_time(flow: &RealTimeProperties, interfering: &[RealTimeProperties], config: &AnalysisConfig) -> Result<f64> {
    let cutoff = config.busy_period_cutoff_factor * flow.di;
    let busy = busy_period(flow, interfering, config)?;

    let instances = ((busy + flow.ji) / flow.ti).ceil();
    if !instances.is_finite() || instances > config.max_iterations as f64 {
        return Err(Error::NonConvergence { iterations: config.max_iterations });
    }

    let mut worst: f64 = 0.0;
    for q in 0..instances as u64 {
        let q = q as f64;
        let queuing = solve_fixed_point(q * flow.ci, interfering, cutoff, config)?;
        worst = worst.max(queuing + flow.ci - q * flow.ti);
    }

    log::trace!("Busy period {} with {} instances, worst-case response time {}.", busy, instances, worst);

    Ok(worst)
}

/// Returns true if the isolated response time of `flow` stays within `Dᵢ`.
/// Non-convergence counts as a miss.
pub fn is_point_schedulable(flow: &RealTimeProperties, interfering: &[RealTimeProperties], config: &AnalysisConfig) -> bool {
    match holistic_response_time(flow, interfering, config) {
        Ok(response_time) => response_time <= flow.di,
        Err(e) => {
            log::debug!("Point analysis gave up: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interferer(ci: f64, ti: f64, ji: f64) -> RealTimeProperties {
        RealTimeProperties::new(ci, ti, ti, 0).with_jitter(ji)
    }

    #[test]
    fn test_busy_period_converges() {
        let flow = RealTimeProperties::new(3.0, 4.0, 20.0, 0).with_jitter(1.0);
        let w = busy_period(&flow, &[interferer(1.0, 5.0, 1.0)], &AnalysisConfig::default()).unwrap();
        assert_eq!(w, 4.0);
    }

    #[test]
    fn test_response_time_takes_worst_instance() {
        // Two instances fall into the busy period: q = 0 answers 4, q = 1 answers 3.
        let flow = RealTimeProperties::new(3.0, 4.0, 20.0, 0).with_jitter(1.0);

        let response_time = holistic_response_time(&flow, &[interferer(1.0, 5.0, 1.0)], &AnalysisConfig::default()).unwrap();

        assert_eq!(response_time, 4.0);
        assert!(is_point_schedulable(&flow, &[interferer(1.0, 5.0, 1.0)], &AnalysisConfig::default()));
    }

    #[test]
    fn test_without_interference_response_is_cost() {
        let flow = RealTimeProperties::new(0.01, 0.02, 0.05, 0);
        let response_time = holistic_response_time(&flow, &[], &AnalysisConfig::default()).unwrap();
        assert!((response_time - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_overload_is_reported_as_non_convergence() {
        let flow = RealTimeProperties::new(1.0, 10.0, 2.0, 0);
        let overload = [interferer(5.0, 5.0, 0.0)];

        let result = busy_period(&flow, &overload, &AnalysisConfig::default());

        assert!(matches!(result, Err(Error::NonConvergence { .. })));
        assert!(!is_point_schedulable(&flow, &overload, &AnalysisConfig::default()));
    }
}
