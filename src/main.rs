use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use cutflow::truth::GenType;
use cutflow::{
    alg, Config, Cut, ParameterSet, ReportFormat, Sample, SampleSet, SampleType, Selection,
};

// ---------------------------------------------------------------------------
// Run spec – everything one selection run needs, as JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RunSpec {
    /// Exposure every sample is scaled to.
    target_pot: f64,
    parameters: ParameterSet,
    samples: Vec<SampleSpec>,
    /// Subset of the standard cuts to run, in order. All of them if absent.
    #[serde(default)]
    cuts: Option<Vec<String>>,
    #[serde(default)]
    config: Config,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SampleSpec {
    name: String,
    path: PathBuf,
    sample_type: SampleType,
    /// Explicit exposure; summed from the subrun sidecar when absent.
    #[serde(default)]
    pot: Option<f64>,
    #[serde(default)]
    gen_type: GenType,
}

/// Pick the requested subset of the standard cut sequence.
fn select_cuts(params: &ParameterSet, wanted: Option<&[String]>) -> Result<Vec<Cut>> {
    let mut cuts = alg::standard_cuts(params);
    let Some(wanted) = wanted else {
        return Ok(cuts);
    };
    let mut picked = Vec::with_capacity(wanted.len());
    for name in wanted {
        match cuts.iter().position(|c| c.name() == name) {
            Some(idx) => picked.push(cuts.remove(idx)),
            None => bail!("unknown cut '{name}' in run spec"),
        }
    }
    Ok(picked)
}

fn main() -> Result<()> {
    env_logger::init();

    let spec_path = std::env::args()
        .nth(1)
        .context("usage: cutflow <runspec.json>")?;
    let text = std::fs::read_to_string(&spec_path)
        .with_context(|| format!("reading run spec {spec_path}"))?;
    let spec: RunSpec = serde_json::from_str(&text).context("parsing run spec")?;

    let cuts = select_cuts(&spec.parameters, spec.cuts.as_deref())?;
    let samples: Vec<Sample> = spec
        .samples
        .into_iter()
        .map(|s| Sample::new(s.name, s.path, s.sample_type, s.pot).with_gen_type(s.gen_type))
        .collect();
    let sample_set = SampleSet::with_target_pot(samples, spec.target_pot);

    let mut selection =
        Selection::with_default_classifier(spec.parameters, sample_set, cuts, spec.config)?;

    selection.open_samples().context("opening samples")?;
    for sample in selection.samples() {
        println!(
            "{}  {:?}  {:.4e} POT",
            sample.name(),
            sample.sample_type(),
            sample.pot().unwrap_or_default()
        );
    }
    println!();

    selection.apply_all().context("applying cuts")?;

    print!("{}", selection.cut_summary(true, ReportFormat::Text)?);
    selection.close_samples();
    Ok(())
}
