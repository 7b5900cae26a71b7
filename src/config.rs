use serde::Deserialize;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// How the efficiency denominator (`n_total_signal`) is accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorMode {
    /// Every stage accumulates the full unfiltered signal count of each
    /// signal-enriched sample, so `efficiency()` is defined at every stage.
    #[default]
    EveryStage,
    /// Only the first stage accumulates the denominator; later stages
    /// report efficiency relative to it via their own counters.
    FirstStageOnly,
}

/// Options that affect how the engine runs but never which physics
/// choices it makes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Events per streamed batch. `None` reads each table in one batch;
    /// set this for tables too large to materialise at once.
    pub batch_size: Option<usize>,

    /// Render efficiency/purity as percentages in reports.
    pub perf_percent: bool,

    /// Efficiency-denominator accumulation mode.
    pub denominator: DenominatorMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: None,
            perf_percent: false,
            denominator: DenominatorMode::default(),
        }
    }
}

impl Config {
    /// Check value combinations that cannot work together.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == Some(0) {
            return Err(Error::Configuration(
                "batch_size must be at least 1 event".into(),
            ));
        }
        Ok(())
    }
}
