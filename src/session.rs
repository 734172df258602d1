//! Retrieval session: owns the chunk list and the semantic index lifecycle.
//!
//! A session chunks its documents once on construction and reuses those
//! chunks for every query. The semantic index is built lazily on the first
//! semantic or hybrid query and kept until the document set changes
//! ([`RetrievalSession::set_documents`]).

use crate::chunk::{chunk_document, HEADER_SEPARATOR};
use crate::error::RetrievalError;
use crate::index::SemanticIndex;
use crate::models::{Chunk, Document, DocumentSummary, SearchResult};
use crate::search::{hybrid_search, keyword_search, semantic_search, SearchOptions, Strategy};

pub struct RetrievalSession {
    documents: Vec<Document>,
    chunks: Vec<Chunk>,
    max_chunk_size: usize,
    index: Option<SemanticIndex>,
    index_built: bool,
}

impl RetrievalSession {
    /// Chunk `documents` (in order) with the given size ceiling.
    pub fn new(documents: Vec<Document>, max_chunk_size: usize) -> Self {
        let chunks = chunk_all(&documents, max_chunk_size);
        tracing::debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            "retrieval session created"
        );
        Self {
            documents,
            chunks,
            max_chunk_size,
            index: None,
            index_built: false,
        }
    }

    /// Attach a semantic index. It is built on first use.
    pub fn with_index(mut self, index: SemanticIndex) -> Self {
        self.index = Some(index);
        self.index_built = false;
        self
    }

    /// Replace the document set, re-chunking and invalidating the index.
    pub fn set_documents(&mut self, documents: Vec<Document>) {
        self.chunks = chunk_all(&documents, self.max_chunk_size);
        self.documents = documents;
        self.index_built = false;
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// The canonical chunk list every strategy scores against.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn document(&self, source_id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.source_id == source_id)
    }

    /// Source id, description and size of every document, in corpus order.
    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        self.documents.iter().map(DocumentSummary::from).collect()
    }

    /// Full text of one document.
    pub fn read(&self, source_id: &str) -> Option<&str> {
        self.document(source_id).map(|d| d.body.as_str())
    }

    pub fn document_chunks(&self, source_id: &str) -> Vec<&Chunk> {
        self.chunks
            .iter()
            .filter(|c| c.source_id == source_id)
            .collect()
    }

    /// Chunks of the section titled `header` in one document, including
    /// its subsections.
    ///
    /// `header` matches either a full header path (`"Intro > Setup"`) or the
    /// innermost title (`"Setup"`), ignoring case. The first matching section
    /// in document order wins.
    pub fn section(&self, source_id: &str, header: &str) -> Vec<&Chunk> {
        let wanted = header.trim().to_lowercase();
        let doc_chunks = self.document_chunks(source_id);

        let Some(target) = doc_chunks.iter().find_map(|c| {
            let path = c.header_path.to_lowercase();
            let innermost = path.rsplit(HEADER_SEPARATOR).next().unwrap_or(path.as_str());
            (path == wanted || innermost == wanted).then(|| c.header_path.clone())
        }) else {
            return Vec::new();
        };

        let nested = format!("{}{}", target, HEADER_SEPARATOR);
        doc_chunks
            .into_iter()
            .filter(|c| c.header_path == target || c.header_path.starts_with(&nested))
            .collect()
    }

    /// The single capability flag all strategy dispatch reads.
    pub fn semantic_available(&self) -> bool {
        self.index.as_ref().is_some_and(|idx| idx.is_available())
    }

    pub fn index(&self) -> Option<&SemanticIndex> {
        self.index.as_ref()
    }

    /// Build the semantic index over the current chunks if not already built.
    ///
    /// Returns the number of newly embedded chunks (0 when already built).
    pub fn ensure_index(&mut self) -> Result<usize, RetrievalError> {
        let index = match self.index.as_mut() {
            Some(index) if index.is_available() => index,
            _ => {
                return Err(RetrievalError::Unavailable {
                    strategy: Strategy::Semantic.to_string(),
                })
            }
        };
        if self.index_built {
            return Ok(0);
        }

        let embedded = index.build(&self.chunks)?;
        self.index_built = true;
        Ok(embedded)
    }

    /// Run one query with the requested strategy.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::Unavailable`] for semantic/hybrid without a usable
    /// backend; [`RetrievalError::Embedding`] if the backend fails during a
    /// semantic search. Hybrid falls back to keyword scores when the backend
    /// fails, and `keyword` never fails.
    pub fn search(
        &mut self,
        query: &str,
        strategy: Strategy,
        opts: &SearchOptions,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        if strategy.requires_embeddings() && !self.semantic_available() {
            return Err(RetrievalError::Unavailable {
                strategy: strategy.to_string(),
            });
        }

        let results = match strategy {
            Strategy::Keyword => keyword_search(&self.chunks, query, opts),
            Strategy::Semantic => {
                self.ensure_index()?;
                match &self.index {
                    Some(index) => semantic_search(&self.chunks, query, index, opts)?,
                    None => Vec::new(),
                }
            }
            Strategy::Hybrid => match self.ensure_index() {
                Ok(_) => hybrid_search(&self.chunks, query, self.index.as_ref(), opts),
                Err(RetrievalError::Embedding(e)) => {
                    tracing::warn!("semantic index build failed, using keyword scores only: {e}");
                    hybrid_search(&self.chunks, query, None, opts)
                }
                Err(e) => return Err(e),
            },
        };

        tracing::debug!(%strategy, query, results = results.len(), "search complete");
        Ok(results)
    }
}

fn chunk_all(documents: &[Document], max_chunk_size: usize) -> Vec<Chunk> {
    documents
        .iter()
        .flat_map(|doc| chunk_document(&doc.body, max_chunk_size, &doc.source_id))
        .collect()
}
