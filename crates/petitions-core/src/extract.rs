//! Raw API payload schemas and their mapping onto canonical records.
//!
//! The list endpoint nests optional objects (`government_response`, `debate`)
//! that are `null` or missing for most petitions. Those are modelled as
//! `Option` here so absence is checked structurally; every other field is
//! required and its absence is an [`ExtractionError`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::petition::{ConstituencySignature, Petition};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("petition record without a usable id: {0}")]
    MissingId(String),
    #[error("petition {id}: {message}")]
    Invalid { id: u64, message: String },
}

// ── List endpoint ──

#[derive(Deserialize)]
struct RawPetition {
    id: u64,
    links: RawLinks,
    attributes: RawAttributes,
}

#[derive(Deserialize)]
struct RawLinks {
    #[serde(rename = "self")]
    self_link: String,
}

#[derive(Deserialize)]
struct RawAttributes {
    state: String,
    action: String,
    background: String,
    #[serde(default)]
    additional_details: Option<String>,
    signature_count: u64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    government_response: Option<RawGovernmentResponse>,
    #[serde(default)]
    debate: Option<RawDebate>,
}

#[derive(Deserialize)]
struct RawGovernmentResponse {
    #[serde(default)]
    responded_on: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct RawDebate {
    #[serde(default)]
    debated_on: Option<NaiveDate>,
}

/// Map one element of the list endpoint's `data[]` onto a [`Petition`].
pub fn extract_petition(raw: &Value) -> Result<Petition, ExtractionError> {
    let id = record_id(raw)?;
    let parsed = RawPetition::deserialize(raw).map_err(|e| ExtractionError::Invalid {
        id,
        message: e.to_string(),
    })?;

    let attrs = parsed.attributes;
    Ok(Petition {
        id: parsed.id,
        url: parsed.links.self_link,
        state: attrs.state,
        action: attrs.action,
        background: attrs.background,
        additional_details: attrs.additional_details.unwrap_or_default(),
        signature_count: attrs.signature_count,
        date_created: attrs.created_at,
        date_responded: attrs.government_response.and_then(|r| r.responded_on),
        date_debated: attrs.debate.and_then(|d| d.debated_on),
    })
}

fn record_id(raw: &Value) -> Result<u64, ExtractionError> {
    match raw.get("id") {
        Some(v) => v
            .as_u64()
            .ok_or_else(|| ExtractionError::MissingId(format!("id is not an unsigned integer: {v}"))),
        None => Err(ExtractionError::MissingId("missing field `id`".into())),
    }
}

// ── Detail endpoint ──

#[derive(Deserialize)]
struct RawDetail {
    data: RawDetailData,
}

#[derive(Deserialize)]
struct RawDetailData {
    attributes: RawDetailAttributes,
}

#[derive(Deserialize)]
struct RawDetailAttributes {
    signatures_by_constituency: Vec<RawConstituency>,
}

#[derive(Deserialize)]
struct RawConstituency {
    name: String,
    ons_code: String,
    signature_count: u64,
}

/// Flatten a petition's detail payload into one row per constituency.
pub fn extract_constituency_signatures(
    petition_id: u64,
    payload: &Value,
) -> Result<Vec<ConstituencySignature>, ExtractionError> {
    let detail = RawDetail::deserialize(payload).map_err(|e| ExtractionError::Invalid {
        id: petition_id,
        message: e.to_string(),
    })?;

    Ok(detail
        .data
        .attributes
        .signatures_by_constituency
        .into_iter()
        .map(|c| ConstituencySignature {
            petition_id,
            constituency: c.name,
            region_code: c.ons_code,
            signatures: c.signature_count,
        })
        .collect())
}
