//! Embedding-based semantic index.
//!
//! [`SemanticIndex::build`] embeds a chunk list (reusing cached vectors by
//! content hash) and keeps one unit vector per chunk, in chunk order.
//! [`SemanticIndex::search`] ranks the same chunk list by cosine similarity
//! to the query, remapped from `[-1, 1]` to `[0, 1]`.
//!
//! ```text
//! chunks ──hash──▶ cache hit? ──yes──────────────┐
//!                     │ no                        ▼
//!                     └─▶ provider.embed ─▶ l2_normalize ─▶ cache ─▶ vectors[i]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::embedding::cache::{content_hash, EmbeddingCache};
use crate::embedding::{dot, embed_query, l2_normalize, EmbeddingProvider};
use crate::error::RetrievalError;
use crate::models::Chunk;

/// A chunk ranked by semantic similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch<'a> {
    /// Position of the chunk in the list passed to `search`.
    pub index: usize,
    pub chunk: &'a Chunk,
    /// Cosine similarity remapped to `[0, 1]`.
    pub similarity: f64,
}

pub struct SemanticIndex {
    provider: Box<dyn EmbeddingProvider>,
    cache_path: Option<PathBuf>,
    cache: EmbeddingCache,
    /// One normalized vector per chunk of the last build, in order.
    vectors: Vec<Vec<f32>>,
}

impl SemanticIndex {
    /// Index without on-disk persistence; vectors are cached in memory only.
    pub fn new(provider: Box<dyn EmbeddingProvider>) -> Self {
        let cache = EmbeddingCache::new(provider.model_name());
        Self {
            provider,
            cache_path: None,
            cache,
            vectors: Vec::new(),
        }
    }

    /// Persist the embedding cache at `path` across sessions.
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// Whether the embedding backend is usable. Never loads a model.
    pub fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    /// True once a build over a non-empty chunk list has completed.
    pub fn is_built(&self) -> bool {
        !self.is_empty()
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Number of distinct vectors held in the embedding cache.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Embed `chunks` and make them searchable.
    ///
    /// Returns the number of vectors computed by the provider (cache misses
    /// only; repeated text is embedded once). An empty chunk list clears the
    /// index and returns 0. Failure to write the cache file is logged and
    /// does not fail the build.
    pub fn build(&mut self, chunks: &[Chunk]) -> Result<usize, RetrievalError> {
        self.vectors.clear();
        if chunks.is_empty() {
            return Ok(0);
        }

        if !self.provider.is_available() {
            return Err(RetrievalError::Unavailable {
                strategy: "semantic".to_string(),
            });
        }

        let model = self.provider.model_name().to_string();
        let mut cache = match &self.cache_path {
            Some(path) => EmbeddingCache::load(path, &model),
            None if self.cache.model() == model => self.cache.clone(),
            None => EmbeddingCache::new(&model),
        };
        tracing::debug!(model = cache.model(), cached = cache.len(), "embedding cache loaded");

        let hashes: Vec<String> = chunks.iter().map(|c| content_hash(&c.content)).collect();

        let mut seen = HashSet::new();
        let missing: Vec<usize> = hashes
            .iter()
            .enumerate()
            .filter(|&(_, h)| !cache.contains(h) && seen.insert(h.as_str()))
            .map(|(i, _)| i)
            .collect();

        if !missing.is_empty() {
            let texts: Vec<String> = missing.iter().map(|&i| chunks[i].content.clone()).collect();
            let embedded = self
                .provider
                .embed(&texts)
                .map_err(RetrievalError::embedding)?;

            if embedded.len() != texts.len() {
                return Err(RetrievalError::embedding(anyhow::anyhow!(
                    "provider returned {} vectors for {} texts",
                    embedded.len(),
                    texts.len()
                )));
            }

            if let Some(pos) = embedded
                .iter()
                .position(|vec| vec.iter().any(|x| !x.is_finite()))
            {
                return Err(RetrievalError::embedding(anyhow::anyhow!(
                    "provider returned a non-finite vector for chunk {} ({})",
                    missing[pos],
                    chunks[missing[pos]].source_id
                )));
            }

            for (&i, mut vec) in missing.iter().zip(embedded) {
                l2_normalize(&mut vec);
                cache.insert(hashes[i].clone(), vec);
            }
        }

        let mut vectors = Vec::with_capacity(hashes.len());
        for hash in &hashes {
            let vec = cache.get(hash).cloned().ok_or_else(|| {
                RetrievalError::embedding(anyhow::anyhow!("no vector cached for {}", hash))
            })?;
            vectors.push(vec);
        }
        self.vectors = vectors;

        if let Some(path) = &self.cache_path {
            if let Err(e) = cache.save(path) {
                tracing::warn!(path = %path.display(), "failed to write embedding cache: {e:#}");
            }
        }
        self.cache = cache;

        tracing::info!(
            chunks = chunks.len(),
            embedded = missing.len(),
            model = %model,
            "semantic index built"
        );
        Ok(missing.len())
    }

    /// Rank `chunks` by similarity to `query`, best first, at most `top_k`.
    ///
    /// `chunks` must be the list the index was built over. An unbuilt index
    /// or a chunk list of a different length yields an empty result.
    pub fn search<'a>(
        &self,
        query: &str,
        chunks: &'a [Chunk],
        top_k: usize,
    ) -> Result<Vec<SemanticMatch<'a>>, RetrievalError> {
        if self.vectors.is_empty() || chunks.is_empty() {
            return Ok(Vec::new());
        }
        if chunks.len() != self.vectors.len() {
            tracing::debug!(
                indexed = self.vectors.len(),
                given = chunks.len(),
                "chunk list differs from the indexed one; no semantic results"
            );
            return Ok(Vec::new());
        }
        if !self.provider.is_available() {
            return Err(RetrievalError::Unavailable {
                strategy: "semantic".to_string(),
            });
        }

        let mut query_vec =
            embed_query(self.provider.as_ref(), query).map_err(RetrievalError::embedding)?;
        l2_normalize(&mut query_vec);

        let mut matches: Vec<SemanticMatch<'a>> = self
            .vectors
            .iter()
            .zip(chunks)
            .enumerate()
            .map(|(index, (vec, chunk))| {
                let raw = f64::from(dot(&query_vec, vec));
                SemanticMatch {
                    index,
                    chunk,
                    similarity: ((raw + 1.0) / 2.0).clamp(0.0, 1.0),
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);
        Ok(matches)
    }
}
