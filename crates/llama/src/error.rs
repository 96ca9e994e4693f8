use mrag_vector_store::VectorStoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlamaError>;

#[derive(Error, Debug)]
pub enum LlamaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an `{"error": {...}}` body
    #[error("llama.cpp error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No healthy {0} server")]
    NoHealthyServer(&'static str),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

impl LlamaError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }
}

impl From<LlamaError> for VectorStoreError {
    fn from(err: LlamaError) -> Self {
        Self::ProviderError(err.to_string())
    }
}
