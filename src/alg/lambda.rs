//! Selection of the Λ decay subsystem.
//!
//! The targeted decay channel is a neutral Λ decaying to a proton and a
//! negative pion, Λ → p + π⁻.

use arrow::array::BooleanArray;

use super::muon::displacement;
use crate::data::model::{list_f64, EventBatch};
use crate::error::Result;
use crate::selection::params::ParameterSet;

/// Box-cut selection of proton/pion candidate track pairs.
///
/// Stand-in for the BDT-based candidate selection, using its three input
/// criteria directly: a proton-hypothesis PID score of at least
/// `proton_pid_cut`, a pion-hypothesis score of at most `pion_pid_cut`,
/// and track starts within `separation_cut` of each other. Both role
/// assignments of each unordered track pair are tried; the event passes
/// when any pair qualifies.
pub fn p_pi_candidates(batch: &EventBatch, params: &ParameterSet) -> Result<BooleanArray> {
    let pid = batch.list_column("trk_llrpid")?;
    let start_x = batch.list_column("trk_start_x")?;
    let start_y = batch.list_column("trk_start_y")?;
    let start_z = batch.list_column("trk_start_z")?;

    let mut mask = Vec::with_capacity(batch.len());
    for event in 0..batch.len() {
        let pids = list_f64(pid, "trk_llrpid", event)?;
        let xs = list_f64(start_x, "trk_start_x", event)?;
        let ys = list_f64(start_y, "trk_start_y", event)?;
        let zs = list_f64(start_z, "trk_start_z", event)?;

        let n = [pids.len(), xs.len(), ys.len(), zs.len()]
            .into_iter()
            .min()
            .unwrap_or(0);
        let mut found = false;
        'pairs: for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let close = displacement((xs[i], ys[i], zs[i]), (xs[j], ys[j], zs[j]))
                    <= params.separation_cut;
                if close
                    && pids[i] >= params.proton_pid_cut
                    && pids[j] <= params.pion_pid_cut
                {
                    found = true;
                    break 'pairs;
                }
            }
        }
        mask.push(Some(found));
    }
    Ok(mask.into_iter().collect())
}

/// Reconstructed p–π⁻ invariant mass inside the Λ window.
///
/// Reads the precomputed `reco_w_lambda` branch (GeV) and accepts events
/// inside `[w_lambda_min, w_lambda_max]`, bounds inclusive.
pub fn invariant_mass_cut(batch: &EventBatch, params: &ParameterSet) -> Result<BooleanArray> {
    let w = batch.f64_column("reco_w_lambda")?;
    Ok((0..batch.len())
        .map(|i| {
            let m = w.value(i);
            Some(m >= params.w_lambda_min && m <= params.w_lambda_max)
        })
        .collect())
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
    fn candidate_pair_found_regardless_of_track_order() {
        // event 0: pion-like then proton-like, starts 1 cm apart → passes
        // event 1: scores fine but starts 50 cm apart → fails
        // event 2: single track → no pair → fails
        let batch = EventBatch::new(
            record_batch_from_arrays(vec![
                ("trk_llrpid", list_col(&[&[-0.5, 0.8], &[0.8, -0.5], &[0.8]])),
                (
                    "trk_start_x",
                    list_col(&[&[10.0, 11.0], &[10.0, 60.0], &[10.0]]),
                ),
                ("trk_start_y", list_col(&[&[0.0, 0.0], &[0.0, 0.0], &[0.0]])),
                (
                    "trk_start_z",
                    list_col(&[&[100.0, 100.0], &[100.0, 100.0], &[100.0]]),
                ),
            ])
            .unwrap(),
        );

        let mask = p_pi_candidates(&batch, &example_params()).unwrap();
        let got: Vec<bool> = (0..mask.len()).map(|i| mask.value(i)).collect();
        assert_eq!(got, vec![true, false, false]);
    }

    #[test]
    fn mass_window_is_inclusive() {
        let batch = EventBatch::new(
            record_batch_from_arrays(vec![(
                "reco_w_lambda",
                Arc::new(Float64Array::from(vec![1.115, 1.09, 1.14, 1.05, 1.30])) as ArrayRef,
            )])
            .unwrap(),
        );
        let mask = invariant_mass_cut(&batch, &example_params()).unwrap();
        let got: Vec<bool> = (0..mask.len()).map(|i| mask.value(i)).collect();
        assert_eq!(got, vec![true, true, true, false, false]);
    }
}
