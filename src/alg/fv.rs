//! Fiducial-volume geometry.

use arrow::array::BooleanArray;

use crate::data::model::EventBatch;
use crate::error::Result;

/// Active TPC fiducial bounds, cm.
pub const FV_X: (f64, f64) = (0.0, 256.35);
pub const FV_Y: (f64, f64) = (-115.53, 117.47);
pub const FV_Z: (f64, f64) = (0.1, 1036.9);

/// Whether a point lies inside the active TPC volume (bounds inclusive).
pub fn in_active_tpc(x: f64, y: f64, z: f64) -> bool {
    x >= FV_X.0
        && x <= FV_X.1
        && y >= FV_Y.0
        && y <= FV_Y.1
        && z >= FV_Z.0
        && z <= FV_Z.1
}

/// Fiducial-volume cut on the reconstructed primary vertex.
///
/// Uses the precomputed `reco_primary_vtx_inFV` flag when the ntuple
/// carries it, otherwise tests the vertex coordinates directly.
pub fn fiducial_cut(batch: &EventBatch) -> Result<BooleanArray> {
    if batch.has_field("reco_primary_vtx_inFV") {
        return Ok(batch.bool_column("reco_primary_vtx_inFV")?.clone());
    }
    let x = batch.f64_column("reco_primary_vtx_x")?;
    let y = batch.f64_column("reco_primary_vtx_y")?;
    let z = batch.f64_column("reco_primary_vtx_z")?;
    Ok((0..batch.len())
        .map(|i| Some(in_active_tpc(x.value(i), y.value(i), z.value(i))))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_active_tpc_cases() {
        let cases: &[(f64, f64, f64, bool)] = &[
            (1.0, 2.0, 3.0, true),
            (-999.0, -999.0, -999.0, false),
            (126.625, 0.97, 518.5, true),
            (0.0, 0.0, 0.0, false),
            (236.35, 233.0, 1036.8, false),
            (-1.0, -1.0, -1.0, false),
            (256.36, 0.0, 0.0, false),
            (0.0, 117.48, 0.0, false),
            (0.0, 0.0, 1036.91, false),
            (126.625, 0.97, 0.1, true),
        ];
        for &(x, y, z, want) in cases {
            assert_eq!(in_active_tpc(x, y, z), want, "({x}, {y}, {z})");
        }
    }
}
