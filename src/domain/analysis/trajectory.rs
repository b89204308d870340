use crate::domain::topology::path::Path;

/// End-to-end bound along a trajectory: every link delay plus every switch delay.
pub fn trajectory_delay(link_delays: &[f64], switch_delays: &[f64]) -> f64 {
    link_delays.iter().sum::<f64>() + switch_delays.iter().sum::<f64>()
}

/// One fixed propagation delay per traversed link of `path`.
pub fn link_delays(path: &Path, delay_per_hop: f64) -> Vec<f64> {
    vec![delay_per_hop; path.hop_count()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trajectory_delay_sums_both_parts() {
        let path: Path = ["1", "2", "3"].into_iter().collect();
        let links = link_delays(&path, 0.5);

        assert_eq!(links, vec![0.5, 0.5]);
        assert_eq!(trajectory_delay(&links, &[1.0, 2.0, 3.0]), 7.0);
        assert_eq!(trajectory_delay(&[], &[]), 0.0);
    }
}
