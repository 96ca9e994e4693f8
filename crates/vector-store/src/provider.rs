use crate::error::Result;
use async_trait::async_trait;

/// Turns a piece of text into an embedding vector.
///
/// Every call made for one group must return vectors of the same length.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Produces a summary for a prompt (instruction followed by the document)
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;
}
