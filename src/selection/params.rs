use serde::Deserialize;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// ParameterSet – the named physics thresholds
// ---------------------------------------------------------------------------

/// All tunable physics thresholds of the selection, fully enumerated.
///
/// Every parameter is required even when only a subset of cuts is run, so
/// a run spec always documents the complete physics configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSet {
    /// Maximum track-start displacement from the primary vertex, cm.
    pub max_separation: f64,
    /// Minimum candidate track length, cm.
    pub min_length: f64,
    /// Muon PID score threshold.
    pub pid_cut: f64,
    /// Proton-hypothesis PID score threshold.
    pub proton_pid_cut: f64,
    /// Pion-hypothesis PID score threshold.
    pub pion_pid_cut: f64,
    /// Maximum separation between decay-product track starts, cm.
    pub separation_cut: f64,
    /// Lower edge of the p–π⁻ invariant-mass window, GeV.
    pub w_lambda_min: f64,
    /// Upper edge of the p–π⁻ invariant-mass window, GeV.
    pub w_lambda_max: f64,
}

impl ParameterSet {
    /// Check the thresholds form a usable physics configuration.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("max_separation", self.max_separation),
            ("min_length", self.min_length),
            ("pid_cut", self.pid_cut),
            ("proton_pid_cut", self.proton_pid_cut),
            ("pion_pid_cut", self.pion_pid_cut),
            ("separation_cut", self.separation_cut),
            ("w_lambda_min", self.w_lambda_min),
            ("w_lambda_max", self.w_lambda_max),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(Error::Configuration(format!(
                    "parameter {name} must be finite, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("max_separation", self.max_separation),
            ("min_length", self.min_length),
            ("separation_cut", self.separation_cut),
        ] {
            if value < 0.0 {
                return Err(Error::Configuration(format!(
                    "parameter {name} must be non-negative, got {value}"
                )));
            }
        }
        if self.w_lambda_min >= self.w_lambda_max {
            return Err(Error::Configuration(format!(
                "invariant-mass window is empty: [{}, {}] GeV",
                self.w_lambda_min, self.w_lambda_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn example() -> ParameterSet {
        ParameterSet {
            max_separation: 1.0,
            min_length: 10.0,
            pid_cut: 0.6,
            proton_pid_cut: 0.35,
            pion_pid_cut: -0.1,
            separation_cut: 2.0,
            w_lambda_min: 1.09,
            w_lambda_max: 1.14,
        }
    }

    #[test]
    fn example_is_valid() {
        assert!(example().validate().is_ok());
    }

    #[test]
    fn empty_mass_window_rejected() {
        let mut p = example();
        p.w_lambda_min = p.w_lambda_max;
        assert!(matches!(p.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let mut p = example();
        p.pid_cut = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn negative_length_rejected() {
        let mut p = example();
        p.min_length = -1.0;
        assert!(p.validate().is_err());
    }
}
