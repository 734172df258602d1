//! Persistent, content-addressed embedding cache.
//!
//! Vectors are keyed by [`content_hash`] of the chunk text, so identical
//! text in different documents (or at different positions) shares one
//! entry. Entries are never evicted; vectors for text that no longer
//! exists are simply unused.
//!
//! # File format
//!
//! ```json
//! {"model": "all-minilm-l6-v2", "embeddings": {"3f2a9c0d11e4b7a8": [0.01, -0.2, ...]}}
//! ```
//!
//! A cache written for a different model is discarded on load. A bare
//! `{hash: vector}` map without the `model` field is still accepted and
//! adopted for the active model; the next save rewrites it with the field.
//!
//! Saves go to a temporary file in the target directory which is then
//! renamed over the cache, so concurrent writers lose updates (last write
//! wins) but never leave a truncated file behind.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Length in hex characters of a cache key.
pub const HASH_HEX_LEN: usize = 16;

/// Hex-encoded prefix of the SHA-256 digest of `text`.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..HASH_HEX_LEN / 2])
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    model: String,
    embeddings: BTreeMap<String, Vec<f32>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredCache {
    Tagged(CacheFile),
    Legacy(HashMap<String, Vec<f32>>),
}

/// In-memory view of the cache file for one embedding model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingCache {
    model: String,
    entries: BTreeMap<String, Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the cache at `path` for `model`.
    ///
    /// A missing, unreadable, or corrupt file, or one written by another
    /// model, yields an empty cache.
    pub fn load(path: &Path, model: &str) -> Self {
        if !path.exists() {
            return Self::new(model);
        }

        let stored = std::fs::read_to_string(path)
            .context("read failed")
            .and_then(|raw| serde_json::from_str::<StoredCache>(&raw).context("parse failed"));

        match stored {
            Ok(StoredCache::Tagged(file)) if file.model == model => Self {
                model: file.model,
                entries: file.embeddings,
            },
            Ok(StoredCache::Tagged(file)) => {
                tracing::warn!(
                    path = %path.display(),
                    cached = %file.model,
                    active = %model,
                    "embedding cache belongs to a different model; ignoring it"
                );
                Self::new(model)
            }
            Ok(StoredCache::Legacy(map)) => {
                tracing::debug!(
                    path = %path.display(),
                    entries = map.len(),
                    "adopting embedding cache without model field"
                );
                Self {
                    model: model.to_string(),
                    entries: map.into_iter().collect(),
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "embedding cache unusable, starting empty: {e:#}");
                Self::new(model)
            }
        }
    }

    /// Atomically write the cache to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

        let tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            let file = CacheFileRef {
                model: &self.model,
                embeddings: &self.entries,
            };
            serde_json::to_writer(&mut writer, &file)?;
            writer.flush()?;
        }
        tmp.persist(path)
            .with_context(|| format!("Failed to replace cache file: {}", path.display()))?;
        Ok(())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn get(&self, hash: &str) -> Option<&Vec<f32>> {
        self.entries.get(hash)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn insert(&mut self, hash: String, vector: Vec<f32>) {
        self.entries.insert(hash, vector);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    model: &'a str,
    embeddings: &'a BTreeMap<String, Vec<f32>>,
}
