//! JSON records to Arrow record batches.

use arrow::array::{ArrayRef, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, FieldRef, Schema, TimeUnit};
use arrow::json::ReaderBuilder;
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

use crate::{ConvertError, flatten_record};

/// Column added to every loaded batch with the time of extraction.
pub const EXTRACTION_TS_COLUMN: &str = "ro_extraction_ts";

/// Converts upstream records into a single record batch.
///
/// Nested objects are flattened first (see [`flatten_record`]); the schema is
/// inferred from all records, with conflicting scalar types widened to text.
/// An empty input, or records without any fields, gives a batch with no rows
/// and no columns.
///
/// # Errors
///
/// Returns an error if a record is not an object or Arrow cannot decode the
/// records.
pub fn records_to_batch(records: &[Value]) -> Result<RecordBatch, ConvertError> {
    let rows = records
        .iter()
        .enumerate()
        .map(|(index, record)| flatten_record(index, record).map(Value::Object))
        .collect::<Result<Vec<_>, _>>()?;

    let schema = infer_json_schema_from_iterator(rows.iter().map(Ok))?;
    if rows.is_empty() || schema.fields().is_empty() {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }
    let schema = Arc::new(schema);

    let mut decoder = ReaderBuilder::new(schema.clone())
        .with_batch_size(rows.len())
        .with_coerce_primitive(true)
        .build_decoder()?;
    decoder.serialize(&rows)?;

    Ok(decoder
        .flush()?
        .unwrap_or_else(|| RecordBatch::new_empty(schema)))
}

/// Returns a copy of `batch` with [`EXTRACTION_TS_COLUMN`] set to `at` on
/// every row, replacing any existing column of that name.
///
/// # Errors
///
/// Returns an error if the new batch cannot be assembled.
pub fn stamp_extraction_time(
    batch: &RecordBatch,
    at: DateTime<Utc>,
) -> Result<RecordBatch, ConvertError> {
    let schema = batch.schema();
    let mut fields: Vec<FieldRef> = Vec::with_capacity(schema.fields().len() + 1);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len() + 1);

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        if field.name() != EXTRACTION_TS_COLUMN {
            fields.push(field.clone());
            columns.push(column.clone());
        }
    }

    fields.push(Arc::new(Field::new(
        EXTRACTION_TS_COLUMN,
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        false,
    )));
    columns.push(Arc::new(
        TimestampMicrosecondArray::from(vec![at.timestamp_micros(); batch.num_rows()])
            .with_timezone("UTC"),
    ));

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(schema),
        columns,
        &options,
    )?)
}
