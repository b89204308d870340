use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timing contract of a flow. All times are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealTimeProperties {
    /// Worst-case transmission cost per release.
    #[serde(rename = "Ci")]
    pub ci: f64,
    /// Period.
    #[serde(rename = "Ti")]
    pub ti: f64,
    /// Relative deadline.
    #[serde(rename = "Di")]
    pub di: f64,
    /// Priority level. Which direction is "higher" is decided by
    /// [`PriorityOrder`](crate::domain::analysis::analysis_config::PriorityOrder).
    #[serde(rename = "Pi")]
    pub pi: i64,
    /// Release jitter.
    #[serde(rename = "Ji", default)]
    pub ji: f64,
    /// Requested bandwidth. Advisory only, the analysis ignores it.
    #[serde(rename = "BWi", default)]
    pub bwi: f64,
}

impl RealTimeProperties {
    pub fn new(ci: f64, ti: f64, di: f64, pi: i64) -> Self {
        Self { ci, ti, di, pi, ji: 0.0, bwi: 0.0 }
    }

    pub fn with_jitter(mut self, ji: f64) -> Self {
        self.ji = ji;
        self
    }

    pub fn with_bandwidth(mut self, bwi: f64) -> Self {
        self.bwi = bwi;
        self
    }

    /// Rejects contracts the analysis cannot work with.
    pub fn validate(&self) -> Result<()> {
        let fields = [("Ci", self.ci), ("Ti", self.ti), ("Di", self.di), ("Ji", self.ji), ("BWi", self.bwi)];
        if let Some((name, value)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Err(Error::InvalidRequest(format!("{} must be a finite number, got {}", name, value)));
        }

        if self.ti <= 0.0 {
            return Err(Error::InvalidRequest(format!("Ti must be positive, got {}", self.ti)));
        }
        if self.di <= 0.0 {
            return Err(Error::InvalidRequest(format!("Di must be positive, got {}", self.di)));
        }
        if self.ci < 0.0 {
            return Err(Error::InvalidRequest(format!("Ci must not be negative, got {}", self.ci)));
        }
        if self.ji < 0.0 {
            return Err(Error::InvalidRequest(format!("Ji must not be negative, got {}", self.ji)));
        }

        Ok(())
    }
}
