//! Keyword, semantic, and hybrid retrieval over an in-memory chunk list.
//!
//! All three strategies take the same canonical chunk list and identify
//! chunks by their position in it, so two chunks with identical text stay
//! distinct results.
//!
//! # Hybrid Scoring Algorithm
//!
//! 1. Score every chunk lexically and divide by the maximum score
//!    (all zeros when the maximum is zero).
//! 2. If a built, available [`SemanticIndex`] is supplied, get a `[0, 1]`
//!    similarity for every chunk.
//! 3. Merge: `score = vector_weight × semantic + text_weight × lexical`, or
//!    the normalized lexical score alone when there are no semantic scores.
//! 4. Keep chunks scoring above `0.01` or containing the query verbatim.
//! 5. Sort by score (desc, stable), truncate to `max_results`, and extract
//!    snippets.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::RetrievalError;
use crate::index::SemanticIndex;
use crate::lexical;
use crate::models::{Chunk, SearchResult};
use crate::snippet::{extract_snippet, DEFAULT_CONTEXT_LINES};

/// Minimum hybrid score for a chunk without a verbatim match to be kept.
pub const MIN_HYBRID_SCORE: f64 = 0.01;

/// Retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Substring match ranked by the lexical score. Always available.
    #[default]
    Keyword,
    /// Embedding similarity only.
    Semantic,
    /// Weighted merge of semantic and normalized lexical scores.
    Hybrid,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Keyword, Strategy::Semantic, Strategy::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Keyword => "keyword",
            Strategy::Semantic => "semantic",
            Strategy::Hybrid => "hybrid",
        }
    }

    /// Whether the strategy needs an embedding backend.
    pub fn requires_embeddings(&self) -> bool {
        !matches!(self, Strategy::Keyword)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RetrievalError::InvalidStrategy(s.to_string()))
    }
}

/// Per-query tuning, decoupled from application config.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub max_results: usize,
    /// Multiplier for the semantic score in hybrid mode.
    pub vector_weight: f64,
    /// Multiplier for the normalized lexical score in hybrid mode.
    pub text_weight: f64,
    /// Lines of context on each side of the snippet's matching line.
    pub context_lines: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 5,
            vector_weight: 0.7,
            text_weight: 0.3,
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

/// Chunks containing `query` (case-insensitive), ranked by raw lexical score.
pub fn keyword_search(chunks: &[Chunk], query: &str, opts: &SearchOptions) -> Vec<SearchResult> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let mut results: Vec<SearchResult> = chunks
        .iter()
        .enumerate()
        .filter(|(_, chunk)| lexical::contains_ignore_case(&chunk.content, query))
        .map(|(i, chunk)| make_result(i, chunk, lexical::score(chunk, query), query, opts))
        .collect();

    rank(&mut results, opts.max_results);
    results
}

/// Chunks ranked by embedding similarity alone.
///
/// # Errors
///
/// [`RetrievalError::Unavailable`] when the index's backend is unusable;
/// [`RetrievalError::Embedding`] when embedding the query fails. An
/// unbuilt index yields `Ok(vec![])`.
pub fn semantic_search(
    chunks: &[Chunk],
    query: &str,
    index: &SemanticIndex,
    opts: &SearchOptions,
) -> Result<Vec<SearchResult>, RetrievalError> {
    if !index.is_available() {
        return Err(RetrievalError::Unavailable {
            strategy: Strategy::Semantic.to_string(),
        });
    }
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let matches = index.search(query, chunks, opts.max_results)?;
    Ok(matches
        .into_iter()
        .map(|m| make_result(m.index, m.chunk, m.similarity, query, opts))
        .collect())
}

/// Weighted merge of semantic and normalized lexical scores.
///
/// Without a usable index this is pure normalized-keyword ranking. A
/// failing query embedding is logged and also degrades to keyword scores.
pub fn hybrid_search(
    chunks: &[Chunk],
    query: &str,
    index: Option<&SemanticIndex>,
    opts: &SearchOptions,
) -> Vec<SearchResult> {
    if query.trim().is_empty() || chunks.is_empty() {
        return Vec::new();
    }

    let raw: Vec<f64> = chunks.iter().map(|c| lexical::score(c, query)).collect();
    let lexical_scores = normalize_by_max(&raw);
    let semantic_scores = semantic_scores(chunks, query, index);

    let mut results = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let combined = match &semantic_scores {
            Some(sem) => opts.vector_weight * sem[i] + opts.text_weight * lexical_scores[i],
            None => lexical_scores[i],
        };

        if combined > MIN_HYBRID_SCORE || lexical::contains_ignore_case(&chunk.content, query) {
            results.push(make_result(i, chunk, combined, query, opts));
        }
    }

    rank(&mut results, opts.max_results);
    results
}

/// Similarity per chunk position, or `None` when no semantic signal exists.
fn semantic_scores(
    chunks: &[Chunk],
    query: &str,
    index: Option<&SemanticIndex>,
) -> Option<Vec<f64>> {
    let index = index.filter(|idx| idx.is_available() && idx.is_built())?;

    let matches = match index.search(query, chunks, chunks.len()) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("semantic scoring failed, using keyword scores only: {e}");
            return None;
        }
    };
    if matches.is_empty() {
        return None;
    }

    let mut scores = vec![0.0; chunks.len()];
    for m in matches {
        scores[m.index] = m.similarity;
    }
    Some(scores)
}

/// Divide every score by the maximum. All zeros when the maximum is not positive.
pub fn normalize_by_max(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|s| s / max).collect()
}

fn make_result(
    chunk_index: usize,
    chunk: &Chunk,
    score: f64,
    query: &str,
    opts: &SearchOptions,
) -> SearchResult {
    SearchResult {
        source_id: chunk.source_id.clone(),
        header_path: chunk.header_path.clone(),
        snippet: extract_snippet(&chunk.content, query, opts.context_lines),
        score,
        start_char: chunk.start_char,
        end_char: chunk.end_char,
        chunk_index,
    }
}

/// Stable sort by score descending, then truncate.
fn rank(results: &mut Vec<SearchResult>, max_results: usize) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(max_results);
}
