//! Error types surfaced by retrieval operations.
//!
//! Every variant is recoverable: callers can report it and retry with the
//! `keyword` strategy, which never fails.

use std::error::Error as StdError;

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Semantic or hybrid search was requested but no embedding backend is usable.
    #[error("strategy '{strategy}' requires an embedding backend, but none is available; retry with 'keyword'")]
    Unavailable { strategy: String },

    /// The strategy name is not one of `keyword`, `semantic`, `hybrid`.
    #[error("invalid strategy '{0}'. Choose from: keyword, semantic, hybrid")]
    InvalidStrategy(String),

    /// The embedding backend failed while building the index or embedding a query.
    #[error("embedding backend failed: {0}")]
    Embedding(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl RetrievalError {
    pub fn embedding(err: anyhow::Error) -> Self {
        Self::Embedding(err.into())
    }
}
