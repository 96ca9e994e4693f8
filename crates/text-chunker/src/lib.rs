//! # mrag Text Chunker
//!
//! Sentence-aware, overlapping text windows for embedding.
//!
//! ## Algorithm
//!
//! ```text
//! Text
//!     │
//!     ├──> Sentence fragments (。．.!?！？ and newline, kept as suffix)
//!     │
//!     ├──> Accumulate into a buffer of at most chunk_size chars
//!     │    ├─> overflow: emit buffer, carry its last overlap_size chars
//!     │    └─> oversized buffer: hard cut at chunk_size
//!     │
//!     └──> Trim, drop empty windows
//! ```
//!
//! Summaries produced by a language model are cleaned with
//! [`normalize_summary`] before they are split.
//!
//! ## Example
//!
//! ```rust
//! use mrag_text_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::new(20, 5)).unwrap();
//! let chunks = chunker.split("Cats are mammals. Dogs are mammals too.");
//! assert_eq!(chunks[0], "Cats are mammals.");
//! assert!(chunks.iter().all(|c| c.chars().count() <= 20));
//! ```

mod chunker;
mod config;
mod error;
mod normalize;

pub use chunker::{split_text, Chunker, SENTENCE_TERMINATORS};
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use normalize::{collapse_blank_lines, normalize_summary, strip_layout_chars, strip_markdown};
