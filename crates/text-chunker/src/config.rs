use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Window sizes for splitting text, counted in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum characters per emitted chunk
    pub chunk_size: usize,

    /// Characters carried from the end of one chunk into the next
    pub overlap_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap_size: 50,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub const fn new(chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            chunk_size,
            overlap_size,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkerError::invalid_config("chunk_size must be > 0"));
        }

        // Each hard cut must advance by at least one character.
        if self.overlap_size >= self.chunk_size {
            return Err(ChunkerError::invalid_config(format!(
                "overlap_size ({}) must be smaller than chunk_size ({})",
                self.overlap_size, self.chunk_size
            )));
        }

        Ok(())
    }
}
