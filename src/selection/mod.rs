/// Selection layer: cuts, samples and the cumulative pipeline.
///
/// Architecture:
/// ```text
///   ┌───────────┐     ┌──────────────┐
///   │ SampleSet  │────▶│  Selection    │  apply_all(): stream batches,
///   │ + target   │     │  (pipeline)   │  AND-prefix the cut masks,
///   └───────────┘     └──────────────┘  accumulate scaled counts
///                            │
///                            ▼
///                      ┌──────────┐
///                      │   Cut     │  n_signal / n_background / n_passing
///                      └──────────┘  → efficiency(), purity(), report
/// ```
pub mod cut;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod sample;
