use std::fmt;

use arrow::array::BooleanArray;

use crate::data::model::{mask_count, EventBatch};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Predicate – the one shape every cut function has
// ---------------------------------------------------------------------------

/// A selection predicate: batch in, one boolean per event out.
///
/// Predicates must be pure (no batch mutation) and total over every batch
/// shape the pipeline presents, including empty batches. Referencing an
/// absent column is a fatal [`Error::MissingField`].
pub type Predicate = Box<dyn Fn(&EventBatch) -> Result<BooleanArray>>;

// ---------------------------------------------------------------------------
// Cut – one named stage of the pipeline
// ---------------------------------------------------------------------------

/// Stage lifecycle within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutState {
    /// No run has touched this stage yet (or the last run aborted).
    #[default]
    Pending,
    /// A streaming pass is accumulating into this stage.
    Accumulating,
    /// A full pass over all samples completed without error.
    Applied,
}

/// One selection cut and the accumulated selection state for it.
///
/// Counters are running totals over the whole sample set, scaled to the
/// target exposure; they reset at the start of each pipeline run and are
/// committed only when the run completes.
pub struct Cut {
    name: String,
    predicate: Predicate,
    n_signal: f64,
    n_background: f64,
    n_passing: f64,
    n_total_signal: f64,
    state: CutState,
}

impl Cut {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&EventBatch) -> Result<BooleanArray> + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            n_signal: 0.0,
            n_background: 0.0,
            n_passing: 0.0,
            n_total_signal: 0.0,
            state: CutState::Pending,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate this cut's predicate alone (not the cumulative mask).
    pub fn evaluate(&self, batch: &EventBatch) -> Result<BooleanArray> {
        (self.predicate)(batch)
    }

    pub fn n_signal(&self) -> f64 {
        self.n_signal
    }

    pub fn n_background(&self) -> f64 {
        self.n_background
    }

    pub fn n_passing(&self) -> f64 {
        self.n_passing
    }

    pub fn n_total_signal(&self) -> f64 {
        self.n_total_signal
    }

    pub fn state(&self) -> CutState {
        self.state
    }

    pub fn applied(&self) -> bool {
        self.state == CutState::Applied
    }

    /// Selection efficiency at this cut: scaled signal passing over the
    /// total signal in the processed signal-enriched samples.
    pub fn efficiency(&self) -> Result<f64> {
        if self.n_total_signal == 0.0 {
            return Err(Error::DivisionUndefined { what: "efficiency" });
        }
        Ok(self.n_signal / self.n_total_signal)
    }

    /// Selection purity at this cut: scaled signal over everything passing.
    pub fn purity(&self) -> Result<f64> {
        if self.n_passing == 0.0 {
            return Err(Error::DivisionUndefined { what: "purity" });
        }
        Ok(self.n_signal / self.n_passing)
    }

    /// Accumulators must never go negative; false signals a scaling bug.
    pub fn validate(&self) -> bool {
        self.n_signal >= 0.0
            && self.n_passing >= 0.0
            && self.n_background >= 0.0
            && self.n_total_signal >= 0.0
    }

    /// Zero the counters and enter `Accumulating` for a fresh run.
    pub(crate) fn begin_run(&mut self) {
        self.n_signal = 0.0;
        self.n_background = 0.0;
        self.n_passing = 0.0;
        self.n_total_signal = 0.0;
        self.state = CutState::Accumulating;
    }

    /// Roll back to the pre-run state after an aborted pass.
    pub(crate) fn abort_run(&mut self) {
        self.begin_run();
        self.state = CutState::Pending;
    }

    /// Adopt a completed run's tally and mark the stage applied.
    pub(crate) fn commit(&mut self, tally: &CutTally) {
        self.n_signal = tally.n_signal;
        self.n_background = tally.n_background;
        self.n_passing = tally.n_passing;
        self.n_total_signal = tally.n_total_signal;
        self.state = CutState::Applied;
    }
}

impl fmt::Debug for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cut")
            .field("name", &self.name)
            .field("n_signal", &self.n_signal)
            .field("n_background", &self.n_background)
            .field("n_passing", &self.n_passing)
            .field("n_total_signal", &self.n_total_signal)
            .field("state", &self.state)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// CutTally – per-run scratch accumulator
// ---------------------------------------------------------------------------

/// Uncommitted per-stage counts for one pipeline run.
///
/// Per-batch contributions are independent and combine by addition, so
/// tallies from concurrently processed batches could be merged without
/// changing the totals.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CutTally {
    pub n_signal: f64,
    pub n_background: f64,
    pub n_passing: f64,
    pub n_total_signal: f64,
}

impl CutTally {
    /// Accumulate one batch's scaled counts for this stage.
    ///
    /// `cumulative` is the AND of all predicates up to and including the
    /// stage; the classifier partitions the surviving events into signal
    /// and background for bookkeeping only.
    pub fn update(
        &mut self,
        batch: &EventBatch,
        cumulative: &BooleanArray,
        classifier: &Predicate,
        scale: f64,
    ) -> Result<()> {
        let passed = batch.filter(cumulative)?;
        let classified = classifier(&passed)?;

        let n_pass = mask_count(cumulative) as f64;
        let n_sig = mask_count(&classified) as f64;
        self.n_passing += scale * n_pass;
        self.n_signal += scale * n_sig;
        self.n_background += scale * (n_pass - n_sig);
        Ok(())
    }

    /// Accumulate the unfiltered-signal denominator contribution.
    pub fn add_total_signal(&mut self, scale: f64, count: f64) {
        self.n_total_signal += scale * count;
    }
}
