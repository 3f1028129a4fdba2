//! Arrow schemas and record batch builders for the three output tables.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, StringArray, TimestampMillisecondArray,
    UInt64Array,
};
use arrow::datatypes::{DataType, Date32Type, Field, Schema, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::chi::ResidualRecord;
use crate::petition::{ClassifiedPetition, ConstituencySignature};

/// Schema for the deduplicated petitions table.
pub fn petitions_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::UInt64, false),
        Field::new("url", DataType::Utf8, false),
        Field::new("state", DataType::Utf8, false),
        Field::new("action", DataType::Utf8, false),
        Field::new("background", DataType::Utf8, false),
        Field::new("additional_details", DataType::Utf8, false),
        Field::new("signature_count", DataType::UInt64, false),
        Field::new(
            "date_created",
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            false,
        ),
        Field::new("date_responded", DataType::Date32, true),
        Field::new("date_debated", DataType::Date32, true),
        Field::new("is_environmental", DataType::Boolean, true),
        Field::new("explanation", DataType::Utf8, true),
    ])
}

/// Schema for per-constituency signature counts.
pub fn constituency_signatures_schema() -> Schema {
    Schema::new(vec![
        Field::new("petition_id", DataType::UInt64, false),
        Field::new("constituency", DataType::Utf8, false),
        Field::new("region_code", DataType::Utf8, false),
        Field::new("signatures", DataType::UInt64, false),
    ])
}

/// Schema for constituency signatures with chi-square residuals.
pub fn residuals_schema() -> Schema {
    Schema::new(vec![
        Field::new("petition_id", DataType::UInt64, false),
        Field::new("region_code", DataType::Utf8, false),
        Field::new("signatures", DataType::UInt64, false),
        Field::new("expected", DataType::Float64, false),
        Field::new("row_percent", DataType::Float64, true),
        Field::new("std_residual", DataType::Float64, true),
        Field::new("significant", DataType::Boolean, false),
    ])
}

fn strings<'a, T>(rows: &'a [T], f: impl Fn(&'a T) -> &'a str) -> ArrayRef {
    Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
}

pub fn petitions_batch(rows: &[ClassifiedPetition]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.petition.id))),
        strings(rows, |r| r.petition.url.as_str()),
        strings(rows, |r| r.petition.state.as_str()),
        strings(rows, |r| r.petition.action.as_str()),
        strings(rows, |r| r.petition.background.as_str()),
        strings(rows, |r| r.petition.additional_details.as_str()),
        Arc::new(UInt64Array::from_iter_values(
            rows.iter().map(|r| r.petition.signature_count),
        )),
        Arc::new(
            TimestampMillisecondArray::from_iter_values(
                rows.iter().map(|r| r.petition.date_created.timestamp_millis()),
            )
            .with_timezone("UTC"),
        ),
        Arc::new(Date32Array::from_iter(
            rows.iter().map(|r| r.petition.date_responded.map(Date32Type::from_naive_date)),
        )),
        Arc::new(Date32Array::from_iter(
            rows.iter().map(|r| r.petition.date_debated.map(Date32Type::from_naive_date)),
        )),
        Arc::new(BooleanArray::from_iter(
            rows.iter()
                .map(|r| r.classification.as_ref().map(|c| c.is_environmental)),
        )),
        Arc::new(StringArray::from_iter(rows.iter().map(|r| {
            r.classification.as_ref().map(|c| c.explanation.as_str())
        }))),
    ];

    RecordBatch::try_new(Arc::new(petitions_schema()), columns)
}

pub fn constituency_signatures_batch(
    rows: &[ConstituencySignature],
) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.petition_id))),
        strings(rows, |r| r.constituency.as_str()),
        strings(rows, |r| r.region_code.as_str()),
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.signatures))),
    ];
    RecordBatch::try_new(Arc::new(constituency_signatures_schema()), columns)
}

pub fn residuals_batch(rows: &[ResidualRecord]) -> Result<RecordBatch, ArrowError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.petition_id))),
        strings(rows, |r| r.region_code.as_str()),
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.observed))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.expected))),
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.row_percent))),
        Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.std_residual))),
        Arc::new(BooleanArray::from_iter(
            rows.iter().map(|r| Some(r.significant)),
        )),
    ];
    RecordBatch::try_new(Arc::new(residuals_schema()), columns)
}
