//! # md-harness
//!
//! Structure-aware chunking and hybrid retrieval over Markdown corpora.
//!
//! md-harness splits documents into section-aware chunks, scores them
//! against a query with a keyword heuristic and (optionally) embedding
//! similarity, and returns short context snippets instead of whole files.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌──────────────┐
//! │ Documents │──▶│ Chunker  │──▶│  chunk list  │
//! └───────────┘   └──────────┘   └──────┬───────┘
//!                          ┌────────────┴────────────┐
//!                          ▼                         ▼
//!                   ┌──────────────┐        ┌────────────────┐
//!                   │ Lexical score│        │ Semantic index │◀──▶ cache.json
//!                   └──────┬───────┘        └───────┬────────┘
//!                          └──────────┬─────────────┘
//!                                     ▼
//!                              ┌─────────────┐
//!                              │ Hybrid merge│──▶ ranked snippets
//!                              └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use md_harness::models::Document;
//! use md_harness::search::{SearchOptions, Strategy};
//! use md_harness::session::RetrievalSession;
//!
//! let docs = vec![Document::new(
//!     "guide.md",
//!     "# Intro\n\nWelcome.\n\n## Setup\n\nRun `install.sh` to begin setup.\n",
//! )];
//! let mut session = RetrievalSession::new(docs, 500);
//! let results = session
//!     .search("setup", Strategy::Keyword, &SearchOptions::default())
//!     .unwrap();
//! assert_eq!(results[0].header_path, "Intro > Setup");
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`connector_fs`] | Filesystem document loader |
//! | [`chunk`] | Header- and paragraph-aware chunking |
//! | [`lexical`] | Keyword relevance scoring |
//! | [`snippet`] | Snippet extraction |
//! | [`embedding`] | Embedding providers, vector utilities, persistent cache |
//! | [`index`] | Semantic nearest-neighbour index |
//! | [`search`] | Keyword, semantic, and hybrid search |
//! | [`session`] | Chunk list and index lifecycle |
//! | [`error`] | Retrieval error taxonomy |

pub mod chunk;
pub mod config;
pub mod connector_fs;
pub mod embedding;
pub mod error;
pub mod index;
pub mod lexical;
pub mod models;
pub mod search;
pub mod session;
pub mod snippet;
