//! Truth-level types: generator tags, PDG codes and the signal definition.
//!
//! These cover the Monte-Carlo information propagated into the ntuples,
//! used for bookkeeping (signal vs background counts) but never for the
//! pass/fail decision of a cut.

use arrow::array::BooleanArray;
use serde::Deserialize;

use crate::alg::fv::in_active_tpc;
use crate::data::model::EventBatch;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Generator tags
// ---------------------------------------------------------------------------

/// The neutrino event generator a Monte-Carlo sample was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum GenType {
    #[default]
    Genie,
    NuWro,
}

/// Generator interaction-mode codes carried by MC events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenEventType {
    /// Quasi-elastic interaction
    Qel,
    /// Resonance
    Res,
    /// Deep inelastic scattering
    Dis,
    /// Coherent
    Coh,
    ElectronScatter,
    /// Meson-exchange current
    Mec,
    Diffractive,
    /// Quasi-elastic with a hyperon in the final state
    Hyp,
    Other,
}

impl GenEventType {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => GenEventType::Qel,
            1 => GenEventType::Res,
            2 => GenEventType::Dis,
            3 => GenEventType::Coh,
            5 => GenEventType::ElectronScatter,
            10 => GenEventType::Mec,
            11 => GenEventType::Diffractive,
            1095 => GenEventType::Hyp,
            _ => GenEventType::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// PDG codes
// ---------------------------------------------------------------------------

/// PDG codes relevant to the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Pdg {
    E = 11,
    NuE = 12,
    Muon = 13,
    NuMu = 14,
    Photon = 22,
    Pi0 = 111,
    Pi = 211,
    Kaon0 = 311,
    Kaon = 321,
    Neutron = 2112,
    Proton = 2212,
    Lambda = 3122,
    Sigma0 = 3212,
}

impl Pdg {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Neutral particles are their own antiparticle.
    fn is_self_conjugate(self) -> bool {
        matches!(
            self,
            Pdg::Photon | Pdg::Neutron | Pdg::Lambda | Pdg::Pi0 | Pdg::Kaon0 | Pdg::Sigma0
        )
    }

    /// The antiparticle code; neutral particles return their own value.
    pub fn anti(self) -> i32 {
        if self.is_self_conjugate() {
            self.code()
        } else {
            -self.code()
        }
    }
}

impl std::ops::Neg for Pdg {
    type Output = i32;

    fn neg(self) -> i32 {
        self.anti()
    }
}

// ---------------------------------------------------------------------------
// Signal definition
// ---------------------------------------------------------------------------

/// Truth-level signal definition for the Σ⁰ search: an anti-muon-neutrino
/// interaction producing a Σ⁰ inside the active volume, with at least one
/// proton and one π⁻ among the decay products.
///
/// Shaped like any cut predicate (one boolean per event) so the pipeline
/// can use it as its signal classifier; it never filters events itself.
pub fn signal_def(batch: &EventBatch) -> Result<BooleanArray> {
    let nu_pdg = batch.i32_column("mc_nu_pdg")?;
    let hyperon_pdg = batch.i32_column("mc_hyperon_pdg")?;
    let x = batch.f64_column("mc_nu_pos_x")?;
    let y = batch.f64_column("mc_nu_pos_y")?;
    let z = batch.f64_column("mc_nu_pos_z")?;
    let protons = batch.count_where_i32("mc_decay_pdg", |p| p == Pdg::Proton.code())?;
    let pions = batch.count_where_i32("mc_decay_pdg", |p| p == Pdg::Pi.anti())?;

    let mask: BooleanArray = (0..batch.len())
        .map(|i| {
            Some(
                nu_pdg.value(i) == Pdg::NuMu.anti()
                    && hyperon_pdg.value(i) == Pdg::Sigma0.code()
                    && in_active_tpc(x.value(i), y.value(i), z.value(i))
                    && protons[i] >= 1
                    && pions[i] >= 1,
            )
        })
        .collect();
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anti_negates_charged_codes() {
        assert_eq!(Pdg::Muon.anti(), -13);
        assert_eq!(-Pdg::Kaon, -321);
        assert_eq!(Pdg::NuMu.anti(), -14);
    }

    #[test]
    fn neutral_particles_are_self_conjugate() {
        assert_eq!(Pdg::Kaon0.anti(), Pdg::Kaon0.code());
        assert_eq!(Pdg::Sigma0.anti(), Pdg::Sigma0.code());
        assert_eq!(Pdg::Lambda.anti(), Pdg::Lambda.code());
    }

    #[test]
    fn gen_event_type_decodes_known_codes() {
        assert_eq!(GenEventType::from_code(1095), GenEventType::Hyp);
        assert_eq!(GenEventType::from_code(10), GenEventType::Mec);
        assert_eq!(GenEventType::from_code(-1), GenEventType::Other);
        assert_eq!(GenEventType::from_code(42), GenEventType::Other);
    }
}
