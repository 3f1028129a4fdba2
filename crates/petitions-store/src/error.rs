use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}
