//! Key -> JSON cache stores.
//!
//! Entries are written once and read many times; nothing here expires or
//! invalidates them. `put` returns only after the bytes are on disk (temp
//! file, fsync, rename), so an entry written before a crash is usable on the
//! next run.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::StoreError;

/// Durable mapping from a normalized request key to its JSON payload.
pub trait CacheStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store `value` under `key`. Durable once this returns `Ok`.
    fn put(&mut self, key: &str, value: &Value) -> Result<(), StoreError>;
}

// ── In-memory ──

/// Process-local store with no persistence.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: HashMap<String, Value>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

// ── One file per entry ──

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: String,
    payload: Value,
}

/// Directory of JSON files, one per entry.
///
/// File names are the SHA-256 of the key, fanned out over 256 subdirectories
/// by the first digest byte. Each file stores the key next to the payload.
#[derive(Debug, Clone)]
pub struct DirCacheStore {
    root: PathBuf,
}

impl DirCacheStore {
    /// Open (creating if needed) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = hex_sha256(key);
        self.root.join(&digest[..2]).join(format!("{digest}.json"))
    }
}

impl CacheStore for DirCacheStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let entry: CacheEntry =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
        if entry.key != key {
            warn!(path = %path.display(), stored = %entry.key, requested = key, "cache key mismatch");
            return Ok(None);
        }
        debug!(key, "cache hit");
        Ok(Some(entry.payload))
    }

    fn put(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        let entry = CacheEntry {
            key: key.to_string(),
            payload: value.clone(),
        };
        let path = self.path_for(key);
        write_atomic(&path, &serde_json::to_vec(&entry)?)?;
        debug!(key, path = %path.display(), "cache entry written");
        Ok(())
    }
}

// ── Single JSON object file ──

/// One JSON object file holding every entry, rewritten on each `put`.
///
/// Suited to small caches keyed by free text, such as classifier verdicts.
#[derive(Debug)]
pub struct JsonFileCacheStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileCacheStore {
    /// Load the file at `path`, or start empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = entries.len(), "opened json cache");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for JsonFileCacheStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.clone());
        write_atomic(&self.path, &serde_json::to_vec_pretty(&self.entries)?)
    }
}

// ── Helpers ──

/// Write `bytes` to a sibling temp file, fsync it, then rename over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn hex_sha256(key: &str) -> String {
    hex::encode(ring::digest::digest(&ring::digest::SHA256, key.as_bytes()))
}
