use petitions_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("classifier not configured: {0}")]
    Config(String),
    #[error(
        "classification batch of {} texts (first: {:?}) still malformed after {attempts} attempts: {message}",
        .batch.len(),
        .batch.first().map(String::as_str).unwrap_or_default()
    )]
    Format {
        batch: Vec<String>,
        attempts: u32,
        message: String,
    },
    #[error("classification service error ({status}): {message}")]
    Service { status: u16, message: String },
    #[error("classification request failed: {0}")]
    Http(String),
    #[error("cached verdict for {text:?} is unreadable: {source}")]
    CorruptEntry {
        text: String,
        source: serde_json::Error,
    },
    #[error("classification cache error: {0}")]
    Store(#[from] StoreError),
}
