use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::array::{Array, Float64Array};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{EventBatch, EventTable};
use crate::error::{Error, Result};

/// Bookkeeping columns every event ntuple must carry.
const BOOKKEEPING_FIELDS: [&str; 3] = ["run", "subrun", "event"];

/// Column of the subrun sidecar holding the per-subrun exposure.
const EXPOSURE_FIELD: &str = "pot";

// ---------------------------------------------------------------------------
// Table opener
// ---------------------------------------------------------------------------

/// Open a Parquet event ntuple as a streamable [`EventTable`].
///
/// Fails with [`Error::NotFound`] when the path cannot be resolved and
/// [`Error::Format`] when the file is not Parquet or lacks the expected
/// event-record structure (run/subrun/event bookkeeping columns).
pub fn open_table(path: &Path) -> Result<EventTable> {
    let builder = reader_builder(path, None)?;
    let schema = builder.schema();
    for field in BOOKKEEPING_FIELDS {
        if schema.field_with_name(field).is_err() {
            return Err(Error::Format(format!(
                "{}: not an event ntuple, missing '{field}' column",
                path.display()
            )));
        }
    }
    Ok(EventTable::File {
        path: path.to_path_buf(),
    })
}

/// Stream record batches from an opened Parquet table.
///
/// `batch_size` of `None` reads the file's natural row-group batches in
/// one pass; a `Some` size bounds memory to at most that many events per
/// batch. Batches arrive strictly in file order.
pub(crate) fn stream_batches(
    path: &Path,
    batch_size: Option<usize>,
) -> Result<Box<dyn Iterator<Item = Result<EventBatch>> + 'static>> {
    let reader = reader_builder(path, batch_size)?
        .build()
        .map_err(|e| Error::Format(format!("{}: {e}", path.display())))?;
    Ok(Box::new(reader.map(|result| {
        result.map(EventBatch::new).map_err(Error::from)
    })))
}

fn reader_builder(
    path: &Path,
    batch_size: Option<usize>,
) -> Result<ParquetRecordBatchReaderBuilder<File>> {
    if !path.is_file() {
        return Err(Error::NotFound {
            path: path.display().to_string(),
        });
    }
    let file = File::open(path)?;
    let mut builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::Format(format!("{}: {e}", path.display())))?;
    // parquet's default batch size is small; a whole-table read still
    // arrives one row group at a time
    builder = builder.with_batch_size(batch_size.unwrap_or(usize::MAX));
    Ok(builder)
}

// ---------------------------------------------------------------------------
// Exposure reader
// ---------------------------------------------------------------------------

/// Sidecar location holding the per-subrun exposure records of an ntuple.
pub fn subruns_path(events_path: &Path) -> PathBuf {
    events_path.with_extension("subruns.parquet")
}

/// Sum the per-subrun exposure (POT) records backing an event ntuple.
///
/// Used when a sample is constructed without an explicit exposure. Read
/// failures propagate as [`Error::NotFound`] / [`Error::Format`]; they are
/// never collapsed into a sentinel value.
pub fn read_exposure(events_path: &Path) -> Result<f64> {
    let sidecar = subruns_path(events_path);
    let reader = reader_builder(&sidecar, None)?
        .build()
        .map_err(|e| Error::Format(format!("{}: {e}", sidecar.display())))?;

    let mut total = 0.0;
    for batch in reader {
        let batch = batch.map_err(Error::from)?;
        let col = batch.column_by_name(EXPOSURE_FIELD).ok_or_else(|| {
            Error::Format(format!(
                "{}: subrun records lack '{EXPOSURE_FIELD}' column",
                sidecar.display()
            ))
        })?;
        let pots = col
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                Error::Format(format!(
                    "{}: '{EXPOSURE_FIELD}' column is {:?}, expected Float64",
                    sidecar.display(),
                    col.data_type()
                ))
            })?;
        total += pots.iter().flatten().sum::<f64>();
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::record_batch_from_arrays;
    use arrow::array::{ArrayRef, Int32Array};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cutflow-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn write_events(path: &Path, n: i32) {
        let ids: Vec<i32> = (0..n).collect();
        let batch = record_batch_from_arrays(vec![
            ("run", Arc::new(Int32Array::from(vec![1; n as usize])) as ArrayRef),
            ("subrun", Arc::new(Int32Array::from(vec![7; n as usize])) as ArrayRef),
            ("event", Arc::new(Int32Array::from(ids)) as ArrayRef),
        ])
        .unwrap();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    fn write_subruns(path: &Path, pots: &[f64]) {
        let batch = record_batch_from_arrays(vec![(
            "pot",
            Arc::new(Float64Array::from(pots.to_vec())) as ArrayRef,
        )])
        .unwrap();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = open_table(Path::new("/no/such/file.parquet")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn non_parquet_file_is_format_error() {
        let path = temp_path("not-parquet.parquet");
        std::fs::write(&path, b"definitely not parquet").unwrap();
        assert!(matches!(open_table(&path), Err(Error::Format(_))));
    }

    #[test]
    fn ntuple_without_bookkeeping_is_format_error() {
        let path = temp_path("no-rse.parquet");
        write_subruns(&path, &[1.0]); // has only a 'pot' column
        assert!(matches!(open_table(&path), Err(Error::Format(_))));
    }

    #[test]
    fn open_and_stream_in_chunks() {
        let path = temp_path("events.parquet");
        write_events(&path, 10);

        let table = open_table(&path).unwrap();
        let batches: Result<Vec<_>> = table.batches(Some(4)).unwrap().collect();
        let batches = batches.unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);

        // file order is preserved across chunks
        assert_eq!(batches[2].i32_column("event").unwrap().value(1), 9);
    }

    #[test]
    fn exposure_sums_subrun_records() {
        let path = temp_path("exposed.parquet");
        write_events(&path, 1);
        write_subruns(&subruns_path(&path), &[1.5e19, 2.5e19, 1.0e19]);

        let pot = read_exposure(&path).unwrap();
        assert!((pot - 5.0e19).abs() < 1e12);
    }

    #[test]
    fn missing_sidecar_is_not_found() {
        let path = temp_path("lonely.parquet");
        write_events(&path, 1);
        assert!(matches!(read_exposure(&path), Err(Error::NotFound { .. })));
    }
}
