//! # mrag llama.cpp provider
//!
//! Embedding and chat-completion client for llama.cpp servers, exposed to
//! the vector store through its [`Embedder`](mrag_vector_store::Embedder)
//! and [`Summarizer`](mrag_vector_store::Summarizer) traits.
//!
//! ```text
//! ServerPool ──(health cached per interval)──> first healthy LlamaClient
//!     ├──> POST /v1/embeddings        data[0].embedding
//!     └──> POST /v1/chat/completions  choices[0].message.content
//! ```

mod client;
mod error;
mod pool;

pub use client::{LlamaClient, DEFAULT_EMBEDDING_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT};
pub use error::{LlamaError, Result};
pub use pool::{ServerPool, DEFAULT_HEALTH_CHECK_INTERVAL};
