//! Cut-based event selection over columnar neutrino-physics ntuples.
//!
//! An ordered sequence of boolean predicates ([`Cut`]s) is applied
//! cumulatively to event batches streamed from a set of [`Sample`]s;
//! per cut, scaled counts of passing signal, background and total events
//! accumulate and efficiency/purity follow. Counts from samples of
//! different exposure are made comparable by scaling each sample to the
//! sample set's target exposure.
//!
//! ```no_run
//! use cutflow::{alg, Config, ParameterSet, ReportFormat, Sample, SampleSet,
//!               SampleType, Selection};
//!
//! # fn run() -> cutflow::Result<()> {
//! let params = ParameterSet {
//!     max_separation: 1.0,
//!     min_length: 10.0,
//!     pid_cut: 0.6,
//!     proton_pid_cut: 0.35,
//!     pion_pid_cut: -0.1,
//!     separation_cut: 2.0,
//!     w_lambda_min: 1.09,
//!     w_lambda_max: 1.14,
//! };
//! let samples = SampleSet::with_target_pot(
//!     vec![Sample::new("hyperon", "hyperon.parquet", SampleType::Hyperon, None)],
//!     1e21,
//! );
//! let mut selection = Selection::with_default_classifier(
//!     params,
//!     samples,
//!     alg::standard_cuts(&params),
//!     Config::default(),
//! )?;
//! selection.open_samples()?;
//! selection.apply_all()?;
//! println!("{}", selection.cut_summary(true, ReportFormat::Text)?);
//! selection.close_samples();
//! # Ok(())
//! # }
//! ```

pub mod alg;
pub mod config;
pub mod data;
pub mod error;
pub mod selection;
pub mod truth;

pub use config::{Config, DenominatorMode};
pub use error::{Error, Result};
pub use selection::cut::{Cut, CutState, Predicate};
pub use selection::params::ParameterSet;
pub use selection::pipeline::Selection;
pub use selection::report::ReportFormat;
pub use selection::sample::{Sample, SampleSet, SampleType};
