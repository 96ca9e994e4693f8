use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    /// Wrong magic symbol, unencodable field, or an inconsistent file pair
    #[error("Format error: {0}")]
    FormatError(String),

    /// Truncated or out-of-range binary data
    #[error("Decode error at byte {offset}: {message}")]
    DecodeError { offset: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The embedding or summarization collaborator failed
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid argument: {0}")]
    ArgumentError(String),

    #[error("Chunker error: {0}")]
    ChunkerError(#[from] mrag_text_chunker::ChunkerError),
}

impl VectorStoreError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::FormatError(msg.into())
    }

    pub fn decode(offset: usize, msg: impl Into<String>) -> Self {
        Self::DecodeError {
            offset,
            message: msg.into(),
        }
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::ProviderError(msg.into())
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        Self::ArgumentError(msg.into())
    }
}
