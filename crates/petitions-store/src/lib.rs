//! Storage layer: durable key -> JSON caches and Parquet export of output tables.

mod cache;
mod error;
mod export;

pub use cache::{CacheStore, DirCacheStore, JsonFileCacheStore, MemoryCacheStore};
pub use error::StoreError;
pub use export::write_parquet;
