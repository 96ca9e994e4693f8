//! # mrag Vector Store
//!
//! File-backed chunk storage and linear similarity search for
//! retrieval-augmented generation.
//!
//! ## Features
//!
//! - **Two files per group**: `<group>.vgs` holds chunks with embeddings,
//!   `<group>.vss` holds per-document summaries
//! - **Exact search**: cosine similarity over every chunk, scratch buffers
//!   recycled through a per-group pool
//! - **Document maintenance**: summarize, chunk, embed and rewrite a group
//!   with no partial writes on provider failure
//! - **Pluggable providers** through the [`Embedder`] and [`Summarizer`] traits
//!
//! ## Architecture
//!
//! ```text
//! Document text
//!     │
//!     ├──> Summarizer ──> normalize ──> Chunker
//!     │                                   └─> Embedder (per chunk)
//!     │
//!     ├──> Group (chunks + summaries + scratch pool)
//!     │      └─> cosine top-k search
//!     │
//!     └──> <group>.vgs / <group>.vss
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use mrag_vector_store::{ChunkerConfig, GroupStore, StubEmbedder, StubSummarizer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> mrag_vector_store::Result<()> {
//!     let store = GroupStore::new(
//!         "data",
//!         ChunkerConfig::default(),
//!         Arc::new(StubEmbedder::default()),
//!         Arc::new(StubSummarizer::default()),
//!     )?;
//!
//!     store.add_document("pets", "cats", "Cats are mammals.").await?;
//!     for chunk in store.search_text("pets", "mammals", 5).await? {
//!         println!("{}: {:.3}", chunk.document_name, chunk.score.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

mod codec;
mod directory;
mod error;
mod group;
mod maintenance;
mod paths;
mod provider;
mod remover;
mod store;
mod stub;
mod summary;
mod types;

pub use codec::{
    decode_chunks, decode_summary, encode_chunks, encode_summary, GROUP_FILE_MAGIC,
    SUMMARY_FILE_MAGIC,
};
pub use directory::list_groups;
pub use error::{Result, VectorStoreError};
pub use group::{cosine_similarity, Group};
pub use maintenance::{
    add_document, remove_document, remove_document_with, AddDocumentStats, SUMMARY_INSTRUCTION,
};
pub use paths::{
    document_name_from_path, group_file_name, group_name_from_file_name, summary_file_name,
    GroupFiles, GROUP_FILE_EXTENSION, SUMMARY_FILE_EXTENSION,
};
pub use provider::{Embedder, Summarizer};
pub use remover::{remove_file_with, FileRemover, OsFileRemover};
pub use store::GroupStore;
pub use stub::{StubEmbedder, StubSummarizer, DEFAULT_STUB_DIMENSION};
pub use summary::SummaryStore;
pub use types::{Chunk, GroupFileInfo};

// Re-export chunking configuration for convenience
pub use mrag_text_chunker::ChunkerConfig;
