use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int32Array, ListArray,
};
use arrow::compute;
use arrow::record_batch::RecordBatch;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// EventBatch – one streamed chunk of events
// ---------------------------------------------------------------------------

/// One immutable, columnar batch of events.
///
/// Each column is addressable by name; scalar columns hold one value per
/// event, list columns hold one variable-length sub-array per event (e.g.
/// per-track quantities). Predicates reduce list columns to a single
/// boolean per event before masking.
#[derive(Debug, Clone)]
pub struct EventBatch {
    batch: RecordBatch,
}

impl EventBatch {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Number of events in the batch.
    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Ordered column names of the batch.
    pub fn field_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Whether the batch carries a column of this name.
    pub fn has_field(&self, name: &str) -> bool {
        self.batch.column_by_name(name).is_some()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| Error::missing_field(name))
    }

    /// A `Float64` scalar column (one value per event).
    pub fn f64_column(&self, name: &str) -> Result<&Float64Array> {
        let col = self.column(name)?;
        col.as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| type_mismatch(name, "Float64", col))
    }

    /// An `Int32` scalar column (one value per event).
    pub fn i32_column(&self, name: &str) -> Result<&Int32Array> {
        let col = self.column(name)?;
        col.as_any()
            .downcast_ref::<Int32Array>()
            .ok_or_else(|| type_mismatch(name, "Int32", col))
    }

    /// A `Boolean` scalar column (one value per event).
    pub fn bool_column(&self, name: &str) -> Result<&BooleanArray> {
        let col = self.column(name)?;
        col.as_any()
            .downcast_ref::<BooleanArray>()
            .ok_or_else(|| type_mismatch(name, "Boolean", col))
    }

    /// A `List` column (one variable-length sub-array per event).
    pub fn list_column(&self, name: &str) -> Result<&ListArray> {
        let col = self.column(name)?;
        col.as_any()
            .downcast_ref::<ListArray>()
            .ok_or_else(|| type_mismatch(name, "List", col))
    }

    /// Per-event count of `List<Float64>` entries satisfying `pred`.
    ///
    /// The reduction that backs "at least N track-like objects" style
    /// predicates. Null sub-arrays count as zero.
    pub fn count_where_f64<F>(&self, name: &str, pred: F) -> Result<Vec<usize>>
    where
        F: Fn(f64) -> bool,
    {
        let list = self.list_column(name)?;
        let mut counts = Vec::with_capacity(list.len());
        for row in 0..list.len() {
            if list.is_null(row) {
                counts.push(0);
                continue;
            }
            let values = list_f64(list, name, row)?;
            counts.push(values.iter().filter(|v| pred(**v)).count());
        }
        Ok(counts)
    }

    /// Per-event count of `List<Int32>` entries satisfying `pred`.
    pub fn count_where_i32<F>(&self, name: &str, pred: F) -> Result<Vec<usize>>
    where
        F: Fn(i32) -> bool,
    {
        let list = self.list_column(name)?;
        let mut counts = Vec::with_capacity(list.len());
        for row in 0..list.len() {
            if list.is_null(row) {
                counts.push(0);
                continue;
            }
            let values = list_i32(list, name, row)?;
            counts.push(values.iter().filter(|v| pred(**v)).count());
        }
        Ok(counts)
    }

    /// Keep only the events where `mask` is true.
    pub fn filter(&self, mask: &BooleanArray) -> Result<EventBatch> {
        if mask.len() != self.len() {
            return Err(Error::Format(format!(
                "mask length {} does not match batch event count {}",
                mask.len(),
                self.len()
            )));
        }
        let filtered = compute::filter_record_batch(&self.batch, mask)?;
        Ok(EventBatch::new(filtered))
    }

    /// Select the events matching a (run, subrun, event) triple.
    pub fn filter_rse(&self, run: i32, subrun: i32, event: i32) -> Result<EventBatch> {
        let runs = self.i32_column("run")?;
        let subruns = self.i32_column("subrun")?;
        let events = self.i32_column("event")?;

        let mask: BooleanArray = (0..self.len())
            .map(|i| {
                Some(
                    runs.value(i) == run
                        && subruns.value(i) == subrun
                        && events.value(i) == event,
                )
            })
            .collect();
        self.filter(&mask)
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }
}

fn type_mismatch(name: &str, expected: &'static str, col: &ArrayRef) -> Error {
    Error::SchemaMismatch {
        field: name.to_string(),
        expected,
        actual: format!("{:?}", col.data_type()),
    }
}

// -- List helpers --

/// Extract the `Vec<f64>` sub-array of a `List<Float64>` column at one row.
pub fn list_f64(list: &ListArray, name: &str, row: usize) -> Result<Vec<f64>> {
    let values = list.value(row);
    let floats = values
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::SchemaMismatch {
            field: name.to_string(),
            expected: "List<Float64>",
            actual: format!("List<{:?}>", values.data_type()),
        })?;
    Ok(floats.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Extract the `Vec<i32>` sub-array of a `List<Int32>` column at one row.
pub fn list_i32(list: &ListArray, name: &str, row: usize) -> Result<Vec<i32>> {
    let values = list.value(row);
    let ints = values
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| Error::SchemaMismatch {
            field: name.to_string(),
            expected: "List<Int32>",
            actual: format!("List<{:?}>", values.data_type()),
        })?;
    Ok(ints.iter().map(|v| v.unwrap_or(0)).collect())
}

// -- Mask helpers --

/// Element-wise AND of two event masks.
pub fn mask_and(a: &BooleanArray, b: &BooleanArray) -> Result<BooleanArray> {
    Ok(compute::and(a, b)?)
}

/// Element-wise negation of an event mask.
pub fn mask_not(mask: &BooleanArray) -> Result<BooleanArray> {
    Ok(compute::not(mask)?)
}

/// Number of events passing a mask.
pub fn mask_count(mask: &BooleanArray) -> usize {
    mask.true_count()
}

// ---------------------------------------------------------------------------
// EventTable – the bound backing data of an open sample
// ---------------------------------------------------------------------------

/// Backing event data for one sample.
///
/// A `File` table streams record batches from a Parquet ntuple so memory
/// stays bounded by one batch; a `Memory` table holds small datasets (and
/// test fixtures) directly.
#[derive(Debug)]
pub enum EventTable {
    File { path: std::path::PathBuf },
    Memory { batches: Vec<RecordBatch> },
}

impl EventTable {
    /// Build an in-memory table from pre-assembled record batches.
    pub fn from_batches(batches: Vec<RecordBatch>) -> Self {
        EventTable::Memory { batches }
    }

    /// Iterate the table's events in file order.
    ///
    /// `batch_size` of `None` yields whole stored batches; otherwise each
    /// yielded batch holds at most `batch_size` events.
    pub fn batches(
        &self,
        batch_size: Option<usize>,
    ) -> Result<Box<dyn Iterator<Item = Result<EventBatch>> + '_>> {
        match self {
            EventTable::File { path } => super::loader::stream_batches(path, batch_size),
            EventTable::Memory { batches } => {
                let chunks = rechunk(batches, batch_size);
                Ok(Box::new(chunks.into_iter().map(|b| Ok(EventBatch::new(b)))))
            }
        }
    }
}

/// Split stored batches into slices of at most `batch_size` events.
fn rechunk(batches: &[RecordBatch], batch_size: Option<usize>) -> Vec<RecordBatch> {
    let Some(size) = batch_size else {
        return batches.to_vec();
    };
    let mut out = Vec::new();
    for batch in batches {
        let mut offset = 0;
        while offset < batch.num_rows() {
            let len = size.min(batch.num_rows() - offset);
            out.push(batch.slice(offset, len));
            offset += len;
        }
        // an empty stored batch still surfaces once
        if batch.num_rows() == 0 {
            out.push(batch.clone());
        }
    }
    out
}

/// Assemble a record batch from `(name, array)` pairs. Test and generator
/// convenience; schema nullability follows the arrays.
pub fn record_batch_from_arrays(columns: Vec<(&str, ArrayRef)>) -> Result<RecordBatch> {
    use arrow::datatypes::{Field, Schema};
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, arr)| Field::new(*name, arr.data_type().clone(), true))
        .collect();
    let arrays: Vec<ArrayRef> = columns.into_iter().map(|(_, arr)| arr).collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Builder, Int32Builder, ListBuilder};

    fn example_batch() -> EventBatch {
        let mut scores = ListBuilder::new(Float64Builder::new());
        scores.append_value([Some(0.9), Some(0.1), Some(0.7)]);
        scores.append_value([Some(0.2)]);
        scores.append_value([] as [Option<f64>; 0]);

        let mut pdgs = ListBuilder::new(Int32Builder::new());
        pdgs.append_value([Some(2212), Some(-211)]);
        pdgs.append_value([Some(13)]);
        pdgs.append_value([] as [Option<i32>; 0]);

        let batch = record_batch_from_arrays(vec![
            ("run", Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef),
            ("subrun", Arc::new(Int32Array::from(vec![10, 20, 30])) as ArrayRef),
            ("event", Arc::new(Int32Array::from(vec![100, 200, 300])) as ArrayRef),
            (
                "vtx_x",
                Arc::new(Float64Array::from(vec![5.0, -40.0, 120.0])) as ArrayRef,
            ),
            ("pfp_trk_shr_score", Arc::new(scores.finish()) as ArrayRef),
            ("mc_decay_pdg", Arc::new(pdgs.finish()) as ArrayRef),
        ])
        .unwrap();
        EventBatch::new(batch)
    }

    #[test]
    fn missing_field_is_named() {
        let batch = example_batch();
        let err = batch.column("no_such_branch").unwrap_err();
        match err {
            Error::MissingField { field, .. } => assert_eq!(field, "no_such_branch"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn type_mismatch_is_reported() {
        let batch = example_batch();
        assert!(matches!(
            batch.f64_column("run"),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn count_where_reduces_lists_per_event() {
        let batch = example_batch();
        let tracks = batch.count_where_f64("pfp_trk_shr_score", |s| s > 0.5).unwrap();
        assert_eq!(tracks, vec![2, 0, 0]);

        let protons = batch.count_where_i32("mc_decay_pdg", |p| p == 2212).unwrap();
        assert_eq!(protons, vec![1, 0, 0]);
    }

    #[test]
    fn filter_keeps_masked_events() {
        let batch = example_batch();
        let mask = BooleanArray::from(vec![true, false, true]);
        let kept = batch.filter(&mask).unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept.i32_column("run").unwrap().values().as_ref(), &[1, 3]);
    }

    #[test]
    fn filter_rejects_misaligned_mask() {
        let batch = example_batch();
        let mask = BooleanArray::from(vec![true, false]);
        assert!(batch.filter(&mask).is_err());
    }

    #[test]
    fn filter_rse_selects_single_event() {
        let batch = example_batch();
        let picked = batch.filter_rse(2, 20, 200).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked.i32_column("event").unwrap().value(0), 200);
    }

    #[test]
    fn memory_table_rechunks_to_batch_size() {
        let batch = example_batch();
        let table = EventTable::from_batches(vec![batch.record_batch().clone()]);

        let whole: Vec<_> = table.batches(None).unwrap().collect();
        assert_eq!(whole.len(), 1);

        let chunked: Result<Vec<_>> = table.batches(Some(2)).unwrap().collect();
        let chunked = chunked.unwrap();
        assert_eq!(chunked.len(), 2);
        assert_eq!(chunked[0].len(), 2);
        assert_eq!(chunked[1].len(), 1);
    }
}
