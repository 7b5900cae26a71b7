//! Write a synthetic event ntuple (plus its subrun-exposure sidecar) for
//! demonstration runs and integration tests.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Float64Builder, Int32Array, Int32Builder, ListBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use cutflow::alg::fv::in_active_tpc;
use cutflow::data::loader::subruns_path;
use cutflow::data::model::record_batch_from_arrays;
use cutflow::truth::Pdg;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// One generated event, truth and reco side.
struct Event {
    run: i32,
    subrun: i32,
    event: i32,
    mc_nu_pdg: i32,
    mc_hyperon_pdg: i32,
    mc_nu_pos: (f64, f64, f64),
    mc_decay_pdg: Vec<i32>,
    reco_vtx: (f64, f64, f64),
    trk_score: Vec<f64>,
    trk_llrpid: Vec<f64>,
    trk_length: Vec<f64>,
    trk_start: Vec<(f64, f64, f64)>,
    reco_w_lambda: f64,
}

fn generate_event(id: i32, rng: &mut SimpleRng) -> Event {
    let vtx = (
        rng.uniform(-20.0, 270.0),
        rng.uniform(-130.0, 130.0),
        rng.uniform(-20.0, 1050.0),
    );
    let signal_like = rng.next_f64() < 0.3;

    let (nu_pdg, hyperon_pdg, decays) = if signal_like {
        (
            Pdg::NuMu.anti(),
            Pdg::Sigma0.code(),
            vec![Pdg::Proton.code(), Pdg::Pi.anti(), Pdg::Photon.code()],
        )
    } else if rng.next_f64() < 0.5 {
        // νμ CC background
        (Pdg::NuMu.code(), 0, vec![Pdg::Proton.code(), Pdg::Pi.code()])
    } else {
        (Pdg::NuMu.code(), 0, vec![])
    };

    // reco follows truth with some smearing
    let reco_vtx = (
        vtx.0 + rng.gauss(0.0, 0.5),
        vtx.1 + rng.gauss(0.0, 0.5),
        vtx.2 + rng.gauss(0.0, 0.5),
    );

    let n_trk = 1 + (rng.next_u64() % 4) as usize;
    let mut trk_score = Vec::with_capacity(n_trk);
    let mut trk_llrpid = Vec::with_capacity(n_trk);
    let mut trk_length = Vec::with_capacity(n_trk);
    let mut trk_start = Vec::with_capacity(n_trk);
    for _ in 0..n_trk {
        trk_score.push(rng.uniform(0.0, 1.0));
        trk_llrpid.push(rng.uniform(-1.0, 1.0));
        trk_length.push(rng.uniform(1.0, 120.0));
        trk_start.push((
            reco_vtx.0 + rng.gauss(0.0, 2.0),
            reco_vtx.1 + rng.gauss(0.0, 2.0),
            reco_vtx.2 + rng.gauss(0.0, 2.0),
        ));
    }

    let reco_w_lambda = if signal_like {
        rng.gauss(1.1157, 0.01)
    } else {
        rng.uniform(1.0, 1.4)
    };

    Event {
        run: 1,
        subrun: id / 50,
        event: id,
        mc_nu_pdg: nu_pdg,
        mc_hyperon_pdg: hyperon_pdg,
        mc_nu_pos: vtx,
        mc_decay_pdg: decays,
        reco_vtx,
        trk_score,
        trk_llrpid,
        trk_length,
        trk_start,
        reco_w_lambda,
    }
}

fn list_f64_array(rows: impl Iterator<Item = Vec<f64>>) -> ArrayRef {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in rows {
        builder.append_value(row.into_iter().map(Some));
    }
    Arc::new(builder.finish())
}

fn list_i32_array(rows: impl Iterator<Item = Vec<i32>>) -> ArrayRef {
    let mut builder = ListBuilder::new(Int32Builder::new());
    for row in rows {
        builder.append_value(row.into_iter().map(Some));
    }
    Arc::new(builder.finish())
}

fn events_to_batch(events: &[Event]) -> Result<RecordBatch> {
    let i32_col = |f: &dyn Fn(&Event) -> i32| -> ArrayRef {
        Arc::new(Int32Array::from(events.iter().map(f).collect::<Vec<_>>()))
    };
    let f64_col = |f: &dyn Fn(&Event) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(events.iter().map(f).collect::<Vec<_>>()))
    };

    let in_fv: ArrayRef = Arc::new(BooleanArray::from(
        events
            .iter()
            .map(|e| in_active_tpc(e.reco_vtx.0, e.reco_vtx.1, e.reco_vtx.2))
            .collect::<Vec<_>>(),
    ));

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("run", i32_col(&|e| e.run)),
        ("subrun", i32_col(&|e| e.subrun)),
        ("event", i32_col(&|e| e.event)),
        ("mc_nu_pdg", i32_col(&|e| e.mc_nu_pdg)),
        ("mc_hyperon_pdg", i32_col(&|e| e.mc_hyperon_pdg)),
        ("mc_nu_pos_x", f64_col(&|e| e.mc_nu_pos.0)),
        ("mc_nu_pos_y", f64_col(&|e| e.mc_nu_pos.1)),
        ("mc_nu_pos_z", f64_col(&|e| e.mc_nu_pos.2)),
        (
            "mc_decay_pdg",
            list_i32_array(events.iter().map(|e| e.mc_decay_pdg.clone())),
        ),
        ("reco_primary_vtx_x", f64_col(&|e| e.reco_vtx.0)),
        ("reco_primary_vtx_y", f64_col(&|e| e.reco_vtx.1)),
        ("reco_primary_vtx_z", f64_col(&|e| e.reco_vtx.2)),
        ("reco_primary_vtx_inFV", in_fv),
        (
            "pfp_trk_shr_score",
            list_f64_array(events.iter().map(|e| e.trk_score.clone())),
        ),
        (
            "trk_llrpid",
            list_f64_array(events.iter().map(|e| e.trk_llrpid.clone())),
        ),
        (
            "trk_length",
            list_f64_array(events.iter().map(|e| e.trk_length.clone())),
        ),
        (
            "trk_start_x",
            list_f64_array(events.iter().map(|e| e.trk_start.iter().map(|p| p.0).collect())),
        ),
        (
            "trk_start_y",
            list_f64_array(events.iter().map(|e| e.trk_start.iter().map(|p| p.1).collect())),
        ),
        (
            "trk_start_z",
            list_f64_array(events.iter().map(|e| e.trk_start.iter().map(|p| p.2).collect())),
        ),
        ("reco_w_lambda", f64_col(&|e| e.reco_w_lambda)),
    ];

    Ok(record_batch_from_arrays(columns)?)
}

fn write_parquet(path: &std::path::Path, batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let out_path: std::path::PathBuf = args
        .next()
        .context("usage: generate_events <out.parquet> [n_events]")?
        .into();
    let n_events: i32 = match args.next() {
        Some(n) => n.parse().context("n_events must be an integer")?,
        None => 500,
    };

    let mut rng = SimpleRng::new(42);
    let events: Vec<Event> = (0..n_events).map(|i| generate_event(i, &mut rng)).collect();
    write_parquet(&out_path, &events_to_batch(&events)?)?;

    // one exposure record per generated subrun
    let n_subruns = (n_events / 50).max(1);
    let pots: Vec<f64> = (0..n_subruns).map(|_| rng.uniform(0.8e18, 1.2e18)).collect();
    let subruns = RecordBatch::try_new(
        Arc::new(Schema::new(vec![
            Field::new("subrun", DataType::Int32, false),
            Field::new("pot", DataType::Float64, false),
        ])),
        vec![
            Arc::new(Int32Array::from((0..n_subruns).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(pots.clone())),
        ],
    )?;
    write_parquet(&subruns_path(&out_path), &subruns)?;

    println!(
        "Wrote {} events to {} ({} subruns, {:.4e} POT)",
        n_events,
        out_path.display(),
        n_subruns,
        pots.iter().sum::<f64>()
    );
    Ok(())
}
