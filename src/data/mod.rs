/// Data layer: columnar event model and file loading.
///
/// Architecture:
/// ```text
///  events .parquet  (+ <stem>.subruns.parquet sidecar)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  open file → EventTable, sum per-subrun exposure
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ EventTable │  streamed batches, memory bounded by one batch
///   └────────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ EventBatch │  named columns, boolean masks, per-event reductions
///   └────────────┘
/// ```
pub mod loader;
pub mod model;
