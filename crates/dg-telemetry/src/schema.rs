//! Arrow schema for the sample table.
//!
//! Column names follow the logical row schema in `dg_common::schema`, so a
//! Parquet part file reads back with the same column set as the SQL table.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use dg_common::{Column, Sample, COLUMNS};

use crate::error::SinkError;

fn arrow_type(column: Column) -> DataType {
    match column {
        Column::InsertionTime | Column::TimeOfCosineOfCurrentAngle => {
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
        }
        Column::IntervalAtWhichCosineIsTaken => DataType::Int64,
        _ => DataType::Float64,
    }
}

/// Arrow schema for sample rows, one field per logical column.
pub fn samples_schema() -> SchemaRef {
    let fields: Vec<Field> = COLUMNS
        .iter()
        .map(|c| Field::new(c.name(), arrow_type(*c), false))
        .collect();
    Arc::new(Schema::new(fields))
}

fn micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

/// Convert rows into a record batch matching [`samples_schema`].
pub fn samples_to_record_batch(
    rows: &[Sample],
    insertion_time: DateTime<Utc>,
    schema: SchemaRef,
) -> Result<RecordBatch, SinkError> {
    let inserted = micros(insertion_time);
    let timestamp = |values: Vec<i64>| -> ArrayRef {
        Arc::new(TimestampMicrosecondArray::from(values).with_timezone("UTC"))
    };
    let float = |f: fn(&Sample) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let columns: Vec<ArrayRef> = vec![
        timestamp(vec![inserted; rows.len()]),
        float(|r| r.seed_angle),
        float(|r| r.rotation),
        float(|r| r.current_angle),
        float(|r| r.value),
        timestamp(rows.iter().map(|r| micros(r.timestamp)).collect()),
        Arc::new(Int64Array::from(
            rows.iter()
                .map(|r| i64::try_from(r.interval_ms).unwrap_or(i64::MAX))
                .collect::<Vec<_>>(),
        )),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}
