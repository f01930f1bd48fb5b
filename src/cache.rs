//! Incremental transform cache.
//!
//! Keyed by a sha-256 of the source content salted with the build mode
//! and stage chain, storing the serialized transform record. A hash hit
//! skips chain execution on rebuilds; everything here is best-effort
//! and a cold or corrupt cache only costs time.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::executor::TransformRecord;
use crate::mode::BuildMode;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    hash: String,
    record: TransformRecord,
}

pub struct IncrementalCache {
    cache_dir: PathBuf,
}

impl IncrementalCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).ok();
        }
        Self { cache_dir }
    }

    fn compute_hash(source: &str, mode: BuildMode, chain: &[String]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(mode.to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(chain.join("+").as_bytes());
        hasher.update(b"\0");
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, file_path: &str) -> PathBuf {
        let safe_name = file_path
            .replace('/', "_")
            .replace('\\', "_")
            .replace(':', "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(
        &self,
        file_path: &str,
        source: &str,
        mode: BuildMode,
        chain: &[String],
    ) -> Option<TransformRecord> {
        let entry_path = self.entry_path(file_path);
        if !entry_path.exists() {
            return None;
        }

        let data = fs::read_to_string(&entry_path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                debug!(file = file_path, error = %e, "invalidating corrupt cache entry");
                fs::remove_file(entry_path).ok();
                return None;
            }
        };

        if entry.hash == Self::compute_hash(source, mode, chain) {
            Some(entry.record)
        } else {
            None
        }
    }

    pub fn set(
        &self,
        file_path: &str,
        source: &str,
        mode: BuildMode,
        chain: &[String],
        record: &TransformRecord,
    ) {
        let entry = CacheEntry {
            hash: Self::compute_hash(source, mode, chain),
            record: record.clone(),
        };
        if let Ok(data) = serde_json::to_string(&entry) {
            fs::write(self.entry_path(file_path), data).ok();
        }
    }
}
