//! Offline providers: deterministic hash embeddings and a pass-through
//! summarizer. Selected with `MRAG_EMBEDDING_MODE=stub` and used by tests.

use crate::error::{Result, VectorStoreError};
use crate::maintenance::SUMMARY_INSTRUCTION;
use crate::provider::{Embedder, Summarizer};
use async_trait::async_trait;

pub const DEFAULT_STUB_DIMENSION: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(VectorStoreError::argument("stub dimension must be > 0"));
        }
        Ok(Self { dimension })
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Same text and dimension always give the same unit vector, so a chunk
    /// searched with its own text scores 1.0.
    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut values: Vec<f32> = HashStream::seeded(text, self.dimension)
            .take(self.dimension)
            .collect();
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        values
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_STUB_DIMENSION,
        }
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }
}

/// Returns the document text itself, cut to `max_chars` characters
#[derive(Debug, Clone, Copy, Default)]
pub struct StubSummarizer {
    max_chars: Option<usize>,
}

impl StubSummarizer {
    #[must_use]
    pub const fn truncating(max_chars: usize) -> Self {
        Self {
            max_chars: Some(max_chars),
        }
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String> {
        let body = prompt.strip_prefix(SUMMARY_INSTRUCTION).unwrap_or(prompt);
        Ok(match self.max_chars {
            Some(limit) => body.chars().take(limit).collect(),
            None => body.to_string(),
        })
    }
}

/// Splitmix64 sequence seeded from an FNV-1a hash of the text, yielding
/// values in `[-1, 1)`.
struct HashStream {
    state: u64,
}

impl HashStream {
    const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

    fn seeded(text: &str, dimension: usize) -> Self {
        let hash = text
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
                (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
            });
        Self {
            state: hash ^ (dimension as u64).wrapping_mul(Self::GOLDEN_GAMMA),
        }
    }
}

impl Iterator for HashStream {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.state = self.state.wrapping_add(Self::GOLDEN_GAMMA);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        // top 24 bits fit an f32 mantissa exactly
        #[allow(clippy::cast_precision_loss)]
        let unit = (z >> 40) as f32 / (1u32 << 24) as f32;
        Some(unit.mul_add(2.0, -1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_embeddings_are_deterministic_and_unit_length() {
        let embedder = StubEmbedder::new(8).unwrap();
        let a = embedder.embed("hello").await.unwrap();
        let b = embedder.embed("hello").await.unwrap();
        let c = embedder.embed("world").await.unwrap();

        assert_eq!(a.len(), 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn stub_summarizer_drops_the_instruction() {
        let prompt = format!("{SUMMARY_INSTRUCTION}Cats are mammals.");
        let summary = StubSummarizer::default().summarize(&prompt).await.unwrap();
        assert_eq!(summary, "Cats are mammals.");

        let short = StubSummarizer::truncating(4).summarize(&prompt).await.unwrap();
        assert_eq!(short, "Cats");
    }

    #[test]
    fn hash_stream_stays_in_range_and_depends_on_dimension() {
        let values: Vec<f32> = HashStream::seeded("cats", 16).take(256).collect();
        assert!(values.iter().all(|v| (-1.0..1.0).contains(v)));
        let other: Vec<f32> = HashStream::seeded("cats", 8).take(256).collect();
        assert_ne!(values, other);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(StubEmbedder::new(0).is_err());
    }
}
