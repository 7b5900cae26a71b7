//! Muon candidate identification.

use arrow::array::BooleanArray;

use crate::data::model::{list_f64, EventBatch};
use crate::error::Result;
use crate::selection::params::ParameterSet;

/// Muon PID box cut.
///
/// A track is a muon candidate when its PID score is below
/// `pid_cut`, it is at least `min_length` long, and it starts within
/// `max_separation` of the reconstructed primary vertex. The event passes
/// when it has at least one candidate.
pub fn muon_candidate(batch: &EventBatch, params: &ParameterSet) -> Result<BooleanArray> {
    let pid = batch.list_column("trk_llrpid")?;
    let length = batch.list_column("trk_length")?;
    let start_x = batch.list_column("trk_start_x")?;
    let start_y = batch.list_column("trk_start_y")?;
    let start_z = batch.list_column("trk_start_z")?;
    let vtx_x = batch.f64_column("reco_primary_vtx_x")?;
    let vtx_y = batch.f64_column("reco_primary_vtx_y")?;
    let vtx_z = batch.f64_column("reco_primary_vtx_z")?;

    let mut mask = Vec::with_capacity(batch.len());
    for event in 0..batch.len() {
        let pids = list_f64(pid, "trk_llrpid", event)?;
        let lengths = list_f64(length, "trk_length", event)?;
        let xs = list_f64(start_x, "trk_start_x", event)?;
        let ys = list_f64(start_y, "trk_start_y", event)?;
        let zs = list_f64(start_z, "trk_start_z", event)?;
        let vtx = (vtx_x.value(event), vtx_y.value(event), vtx_z.value(event));

        let n = [pids.len(), lengths.len(), xs.len(), ys.len(), zs.len()]
            .into_iter()
            .min()
            .unwrap_or(0);
        let found = (0..n).any(|trk| {
            pids[trk] < params.pid_cut
                && lengths[trk] >= params.min_length
                && displacement(vtx, (xs[trk], ys[trk], zs[trk])) < params.max_separation
        });
        mask.push(Some(found));
    }
    Ok(mask.into_iter().collect())
}

/// Euclidean distance between two points, cm.
pub(crate) fn displacement(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2) + (a.2 - b.2).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::record_batch_from_arrays;
    use arrow::array::{ArrayRef, Float64Array, Float64Builder, ListBuilder};
    use std::sync::Arc;

    fn list_col(rows: &[&[f64]]) -> ArrayRef {
        let mut builder = ListBuilder::new(Float64Builder::new());
        for row in rows {
            builder.append_value(row.iter().map(|v| Some(*v)));
        }
        Arc::new(builder.finish())
    }

    fn example_params() -> ParameterSet {
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
    fn one_candidate_track_passes_the_event() {
        // event 0: second track qualifies; event 1: PID too high;
        // event 2: too short; event 3: starts too far from the vertex
        let batch = EventBatch::new(
            record_batch_from_arrays(vec![
                (
                    "trk_llrpid",
                    list_col(&[&[0.9, 0.2], &[0.9], &[0.2], &[0.2]]),
                ),
                (
                    "trk_length",
                    list_col(&[&[50.0, 25.0], &[25.0], &[5.0], &[25.0]]),
                ),
                (
                    "trk_start_x",
                    list_col(&[&[10.0, 10.2], &[10.0], &[10.0], &[40.0]]),
                ),
                (
                    "trk_start_y",
                    list_col(&[&[0.0, 0.0], &[0.0], &[0.0], &[0.0]]),
                ),
                (
                    "trk_start_z",
                    list_col(&[&[100.0, 100.0], &[100.0], &[100.0], &[100.0]]),
                ),
                (
                    "reco_primary_vtx_x",
                    Arc::new(Float64Array::from(vec![10.0; 4])) as ArrayRef,
                ),
                (
                    "reco_primary_vtx_y",
                    Arc::new(Float64Array::from(vec![0.0; 4])) as ArrayRef,
                ),
                (
                    "reco_primary_vtx_z",
                    Arc::new(Float64Array::from(vec![100.0; 4])) as ArrayRef,
                ),
            ])
            .unwrap(),
        );

        let mask = muon_candidate(&batch, &example_params()).unwrap();
        let got: Vec<bool> = (0..mask.len()).map(|i| mask.value(i)).collect();
        assert_eq!(got, vec![true, false, false, false]);
    }

    #[test]
    fn empty_batch_yields_empty_mask() {
        let batch = EventBatch::new(
            record_batch_from_arrays(vec![
                ("trk_llrpid", list_col(&[])),
                ("trk_length", list_col(&[])),
                ("trk_start_x", list_col(&[])),
                ("trk_start_y", list_col(&[])),
                ("trk_start_z", list_col(&[])),
                (
                    "reco_primary_vtx_x",
                    Arc::new(Float64Array::from(Vec::<f64>::new())) as ArrayRef,
                ),
                (
                    "reco_primary_vtx_y",
                    Arc::new(Float64Array::from(Vec::<f64>::new())) as ArrayRef,
                ),
                (
                    "reco_primary_vtx_z",
                    Arc::new(Float64Array::from(Vec::<f64>::new())) as ArrayRef,
                ),
            ])
            .unwrap(),
        );
        let mask = muon_candidate(&batch, &example_params()).unwrap();
        assert_eq!(mask.len(), 0);
    }
}
