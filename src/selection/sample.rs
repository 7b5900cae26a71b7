use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::loader;
use crate::data::model::EventTable;
use crate::error::{Error, Result};
use crate::truth::GenType;

// ---------------------------------------------------------------------------
// SampleType
// ---------------------------------------------------------------------------

/// The kinds of samples fed into the selection, both Monte-Carlo and
/// directly recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SampleType {
    /// Recorded detector data.
    Data,
    /// Combined background MC.
    Background,
    /// Signal-enriched hyperon MC; the only type contributing to the
    /// efficiency denominator.
    Hyperon,
    /// Out-of-TPC interactions.
    Dirt,
    /// Interactions of cosmic origin.
    Ext,
}

impl SampleType {
    pub fn is_signal_enriched(self) -> bool {
        matches!(self, SampleType::Hyperon)
    }
}

// ---------------------------------------------------------------------------
// Sample
// ---------------------------------------------------------------------------

/// One dataset entering the selection: a named ntuple with a type tag and
/// an exposure used to scale its counts onto the common target.
///
/// The backing table is bound by [`Sample::open`] and unbound by
/// [`Sample::close`]; a closed sample cannot be iterated.
#[derive(Debug)]
pub struct Sample {
    name: String,
    path: PathBuf,
    sample_type: SampleType,
    gen_type: GenType,
    pot: Option<f64>,
    table: Option<EventTable>,
}

impl Sample {
    /// A new, unopened sample. Pass `None` for the exposure to have it
    /// summed from the ntuple's subrun records at open time.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        sample_type: SampleType,
        pot: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            sample_type,
            gen_type: GenType::default(),
            pot,
            table: None,
        }
    }

    pub fn with_gen_type(mut self, gen_type: GenType) -> Self {
        self.gen_type = gen_type;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    pub fn gen_type(&self) -> GenType {
        self.gen_type
    }

    pub fn is_data(&self) -> bool {
        self.sample_type == SampleType::Data
    }

    /// The sample's exposure; `None` until given explicitly or read at open.
    pub fn pot(&self) -> Option<f64> {
        self.pot
    }

    pub fn is_open(&self) -> bool {
        self.table.is_some()
    }

    /// Bind the backing table, reading the exposure from the subrun
    /// records when none was given. Read failures propagate; they are
    /// never replaced with a placeholder exposure.
    pub fn open(&mut self) -> Result<()> {
        if self.pot.is_none() {
            let pot = loader::read_exposure(&self.path)?;
            log::info!("sample '{}': summed exposure {pot:.4e} from subruns", self.name);
            self.pot = Some(pot);
        }
        self.table = Some(loader::open_table(&self.path)?);
        log::info!("sample '{}': opened {}", self.name, self.path.display());
        Ok(())
    }

    /// Bind an already-built table (small datasets, fixtures). Requires an
    /// explicit exposure since there are no subrun records to sum.
    pub fn bind_table(&mut self, table: EventTable) {
        self.table = Some(table);
    }

    /// Unbind the backing table after I/O has finished.
    pub fn close(&mut self) {
        if self.table.take().is_some() {
            log::info!("sample '{}': closed", self.name);
        }
    }

    /// The bound table, or [`Error::NotOpen`].
    pub fn table(&self) -> Result<&EventTable> {
        self.table.as_ref().ok_or_else(|| Error::NotOpen {
            sample: self.name.clone(),
        })
    }

    /// Sanity check: a known negative exposure or an unresolvable backing
    /// file makes the sample unusable.
    pub fn validate(&self) -> bool {
        if self.pot.is_some_and(|pot| pot < 0.0) {
            return false;
        }
        self.table.is_some() || self.path.is_file()
    }
}

// ---------------------------------------------------------------------------
// SampleSet
// ---------------------------------------------------------------------------

/// An ordered collection of samples plus the target exposure all of them
/// are scaled to. Order is preserved for display; the accumulated totals
/// do not depend on it.
#[derive(Debug, Default)]
pub struct SampleSet {
    samples: Vec<Sample>,
    target_pot: Option<f64>,
}

impl SampleSet {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            target_pot: None,
        }
    }

    pub fn with_target_pot(samples: Vec<Sample>, target_pot: f64) -> Self {
        Self {
            samples,
            target_pot: Some(target_pot),
        }
    }

    pub fn target_pot(&self) -> Option<f64> {
        self.target_pot
    }

    pub fn set_target_pot(&mut self, target_pot: f64) {
        self.target_pot = Some(target_pot);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Sample> {
        self.samples.iter_mut()
    }

    /// The type tags of all samples, in order.
    pub fn sample_types(&self) -> Vec<SampleType> {
        self.samples.iter().map(|s| s.sample_type()).collect()
    }

    /// Bind every sample's backing table, in order.
    pub fn open_all(&mut self) -> Result<()> {
        for sample in &mut self.samples {
            sample.open()?;
        }
        Ok(())
    }

    /// Unbind every sample's backing table.
    pub fn close_all(&mut self) {
        for sample in &mut self.samples {
            sample.close();
        }
    }

    /// Scaling to a target exposure divides by each sample's own exposure,
    /// so a set with a target requires every known exposure to be positive.
    pub fn validate(&self) -> Result<()> {
        if self.target_pot.is_none() {
            return Ok(());
        }
        for sample in &self.samples {
            if let Some(pot) = sample.pot() {
                if pot <= 0.0 {
                    return Err(Error::Configuration(format!(
                        "sample '{}' has exposure {pot}, cannot scale to a target",
                        sample.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SampleSet {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_distinct_by_name() {
        let s1 = Sample::new("hyperon", "hyperon.parquet", SampleType::Hyperon, Some(1e20));
        let s2 = Sample::new("dirt", "dirt.parquet", SampleType::Dirt, Some(2e30));
        assert_ne!(s1.name(), s2.name());
        assert!(s1.sample_type().is_signal_enriched());
        assert!(!s2.sample_type().is_signal_enriched());
    }

    #[test]
    fn closed_sample_has_no_table() {
        let mut sample = Sample::new("bg", "bg.parquet", SampleType::Background, Some(1e20));
        assert!(!sample.is_open());
        assert!(matches!(sample.table(), Err(Error::NotOpen { .. })));

        sample.bind_table(EventTable::from_batches(vec![]));
        assert!(sample.is_open());
        sample.close();
        assert!(matches!(sample.table(), Err(Error::NotOpen { .. })));
    }

    #[test]
    fn negative_exposure_fails_validation() {
        let sample = Sample::new("bad", "bad.parquet", SampleType::Background, Some(-1.0));
        assert!(!sample.validate());
    }

    #[test]
    fn zero_exposure_invalid_with_target_set() {
        let mut set = SampleSet::with_target_pot(
            vec![Sample::new("empty", "e.parquet", SampleType::Ext, Some(0.0))],
            1e20,
        );
        assert!(set.validate().is_err());
        set.target_pot = None;
        assert!(set.validate().is_ok());
    }
}
