use std::collections::BTreeSet;

use arrow::array::BooleanArray;

use super::cut::{Cut, CutTally, Predicate};
use super::params::ParameterSet;
use super::report::{self, ReportFormat};
use super::sample::{SampleSet, SampleType};
use crate::config::{Config, DenominatorMode};
use crate::data::model::{mask_and, mask_count, EventBatch};
use crate::error::{Error, Result};
use crate::truth::signal_def;

// ---------------------------------------------------------------------------
// Selection – the cut pipeline
// ---------------------------------------------------------------------------

/// The selection pipeline: an ordered sequence of cuts applied
/// cumulatively to every sample's streamed event batches.
///
/// "Passes cut *i*" always means the AND of the predicates of stages
/// `0..=i`, never stage *i* alone. Counts are scaled per sample by
/// `target_pot / sample_pot` so samples of different exposure are
/// comparable.
pub struct Selection {
    parameters: ParameterSet,
    samples: SampleSet,
    cuts: Vec<Cut>,
    classifier: Predicate,
    config: Config,
}

impl Selection {
    /// Assemble a pipeline, rejecting setups that can never run: invalid
    /// parameters or configuration, or duplicate cut names.
    pub fn new(
        parameters: ParameterSet,
        samples: SampleSet,
        cuts: Vec<Cut>,
        classifier: Predicate,
        config: Config,
    ) -> Result<Self> {
        parameters.validate()?;
        config.validate()?;

        let mut seen = BTreeSet::new();
        for cut in &cuts {
            if !seen.insert(cut.name()) {
                return Err(Error::Configuration(format!(
                    "duplicate cut name '{}'",
                    cut.name()
                )));
            }
        }

        Ok(Self {
            parameters,
            samples,
            cuts,
            classifier,
            config,
        })
    }

    /// A pipeline using the truth-level Σ⁰ definition as its classifier.
    pub fn with_default_classifier(
        parameters: ParameterSet,
        samples: SampleSet,
        cuts: Vec<Cut>,
        config: Config,
    ) -> Result<Self> {
        Self::new(parameters, samples, cuts, Box::new(signal_def), config)
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut SampleSet {
        &mut self.samples
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bind every sample's backing table.
    pub fn open_samples(&mut self) -> Result<()> {
        self.samples.open_all()?;
        self.samples.validate()
    }

    /// Unbind every sample's backing table.
    pub fn close_samples(&mut self) {
        self.samples.close_all();
    }

    /// Run the full selection: stream every sample, apply every cut
    /// cumulatively and accumulate scaled counts into the stages.
    ///
    /// Counters are zeroed at the start and the run's tallies committed
    /// only after the pass over all samples completes, so an aborted run
    /// leaves every stage zeroed and `Pending`, and repeating the call on
    /// an unchanged sample set reproduces identical totals.
    pub fn apply_all(&mut self) -> Result<()> {
        let target_pot = self.samples.target_pot().ok_or_else(|| {
            Error::Configuration("sample set has no target exposure to scale to".into())
        })?;

        for cut in &mut self.cuts {
            cut.begin_run();
        }
        match self.accumulate(target_pot) {
            Ok(tallies) => {
                for (cut, tally) in self.cuts.iter_mut().zip(tallies.iter()) {
                    cut.commit(tally);
                }
                Ok(())
            }
            Err(err) => {
                for cut in &mut self.cuts {
                    cut.abort_run();
                }
                Err(err)
            }
        }
    }

    /// One full streaming pass over all samples, into scratch tallies.
    fn accumulate(&self, target_pot: f64) -> Result<Vec<CutTally>> {
        let mut tallies = vec![CutTally::default(); self.cuts.len()];

        for sample in &self.samples {
            let pot = sample.pot().ok_or_else(|| {
                Error::Configuration(format!(
                    "sample '{}' has no exposure; open it or give one explicitly",
                    sample.name()
                ))
            })?;
            if pot == 0.0 {
                return Err(Error::DivisionUndefined {
                    what: "sample scale",
                });
            }
            let scale = target_pot / pot;
            let table = sample.table()?;
            log::info!(
                "sample '{}': applying {} cuts at scale {scale:.4}",
                sample.name(),
                self.cuts.len()
            );

            // batches arrive strictly in file order
            for batch in table.batches(self.config.batch_size)? {
                let batch = batch?;
                self.accumulate_batch(&batch, sample.name(), sample.sample_type(), scale, &mut tallies)?;
            }
        }
        Ok(tallies)
    }

    /// Accumulate one batch into every stage's tally.
    fn accumulate_batch(
        &self,
        batch: &EventBatch,
        sample_name: &str,
        sample_type: SampleType,
        scale: f64,
        tallies: &mut [CutTally],
    ) -> Result<()> {
        // each predicate is evaluated exactly once per batch; cumulative
        // masks are AND-prefixes over the declared order
        let masks: Vec<BooleanArray> = self
            .cuts
            .iter()
            .map(|cut| {
                cut.evaluate(batch)
                    .map_err(|e| e.with_context(cut.name(), sample_name))
            })
            .collect::<Result<_>>()?;

        if sample_type.is_signal_enriched() {
            let truth = (self.classifier)(batch)
                .map_err(|e| e.with_context("signal classifier", sample_name))?;
            let n_signal = mask_count(&truth) as f64;
            match self.config.denominator {
                DenominatorMode::EveryStage => {
                    for tally in tallies.iter_mut() {
                        tally.add_total_signal(scale, n_signal);
                    }
                }
                DenominatorMode::FirstStageOnly => {
                    if let Some(first) = tallies.first_mut() {
                        first.add_total_signal(scale, n_signal);
                    }
                }
            }
        }

        let mut cumulative: Option<BooleanArray> = None;
        for (i, mask) in masks.iter().enumerate() {
            let mask = match &cumulative {
                None => mask.clone(),
                Some(prev) => mask_and(prev, mask)?,
            };
            tallies[i]
                .update(batch, &mask, &self.classifier, scale)
                .map_err(|e| e.with_context(self.cuts[i].name(), sample_name))?;
            cumulative = Some(mask);
        }
        Ok(())
    }

    /// Run validation for all associated cuts.
    pub fn validate_cuts(&self) -> bool {
        self.cuts.iter().all(|cut| cut.validate())
    }

    /// The type tags of all associated samples.
    pub fn sample_types(&self) -> Vec<SampleType> {
        self.samples.sample_types()
    }

    /// Render the per-cut selection summary.
    pub fn cut_summary(&self, header: bool, format: ReportFormat) -> Result<String> {
        report::cut_summary(&self.cuts, &self.config, header, format)
    }
}
