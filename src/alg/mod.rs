//! Domain predicates: the physics selection algorithms.
//!
//! Every function here reduces an [`EventBatch`](crate::data::model::EventBatch)
//! to one boolean per event; [`standard_cuts`] wires them into named
//! pipeline stages.

pub mod fv;
pub mod lambda;
pub mod muon;

use arrow::array::BooleanArray;

use crate::data::model::EventBatch;
use crate::error::Result;
use crate::selection::cut::Cut;
use crate::selection::params::ParameterSet;

/// Track/shower discrimination threshold on the `pfp_trk_shr_score` branch:
/// above is track-like, below is shower-like.
pub const TRACK_SCORE: f64 = 0.5;

/// Events with at least `min_tracks` track-like particle-flow objects.
pub fn track_multiplicity(batch: &EventBatch, min_tracks: usize) -> Result<BooleanArray> {
    let counts = batch.count_where_f64("pfp_trk_shr_score", |s| s > TRACK_SCORE)?;
    Ok(counts.iter().map(|n| Some(*n >= min_tracks)).collect())
}

/// Events with at least `min_showers` shower-like particle-flow objects.
pub fn shower_multiplicity(batch: &EventBatch, min_showers: usize) -> Result<BooleanArray> {
    let counts = batch.count_where_f64("pfp_trk_shr_score", |s| s < TRACK_SCORE)?;
    Ok(counts.iter().map(|n| Some(*n >= min_showers)).collect())
}

/// The standard cut sequence of the analysis, in application order.
///
/// Multiplicity thresholds follow the targeted final state: three
/// track-like objects (µ, p, π⁻) and one shower-like (the Σ⁰ photon).
pub fn standard_cuts(params: &ParameterSet) -> Vec<Cut> {
    let p = *params;
    vec![
        Cut::new("fv", fv::fiducial_cut),
        Cut::new("tracks", |batch: &EventBatch| track_multiplicity(batch, 3)),
        Cut::new("showers", |batch: &EventBatch| shower_multiplicity(batch, 1)),
        Cut::new("muon-id", move |batch: &EventBatch| {
            muon::muon_candidate(batch, &p)
        }),
        Cut::new("lambda-candidates", move |batch: &EventBatch| {
            lambda::p_pi_candidates(batch, &p)
        }),
        Cut::new("w-lambda", move |batch: &EventBatch| {
            lambda::invariant_mass_cut(batch, &p)
        }),
    ]
}
