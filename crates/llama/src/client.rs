use crate::error::{LlamaError, Result};
use async_trait::async_trait;
use mrag_vector_store::{Embedder, Summarizer};
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_EMBEDDING_MODEL: &str = "embeddinggemma";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for one llama.cpp server speaking the OpenAI-compatible API
#[derive(Debug, Clone)]
pub struct LlamaClient {
    http: reqwest::Client,
    base_url: String,
    embedding_model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl LlamaClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(LlamaError::InvalidUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        })
    }

    #[must_use]
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Non-positive values fall back to [`DEFAULT_TEMPERATURE`]
    #[must_use]
    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /v1/embeddings`
    pub async fn embedding(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({ "model": self.embedding_model, "input": text });
        let response = self.post_json("v1/embeddings", &body).await?;
        extract_embedding(&response)
    }

    /// `POST /v1/chat/completions` with a single user message
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let body = chat_request_body(prompt, self.temperature, self.max_tokens);
        let response = self.post_json("v1/chat/completions", &body).await?;
        extract_chat_content(&response)
    }

    /// `GET /health`; any transport failure or non-2xx status is unhealthy
    pub async fn health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http.get(&url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                log::debug!("Health check of {} failed: {err}", self.base_url);
                false
            }
        }
    }

    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{endpoint}", self.base_url);
        log::debug!("POST {url}");
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        parse_response(status.as_u16(), &text)
    }
}

#[async_trait]
impl Embedder for LlamaClient {
    async fn embed(&self, text: &str) -> mrag_vector_store::Result<Vec<f32>> {
        Ok(self.embedding(text).await?)
    }
}

#[async_trait]
impl Summarizer for LlamaClient {
    async fn summarize(&self, prompt: &str) -> mrag_vector_store::Result<String> {
        Ok(self.chat(prompt).await?)
    }
}

pub(crate) fn chat_request_body(
    prompt: &str,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
) -> Value {
    let temperature = temperature
        .filter(|t| *t > 0.0)
        .unwrap_or(DEFAULT_TEMPERATURE);
    let mut body = json!({
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": temperature,
    });
    if let Some(max_tokens) = max_tokens.filter(|n| *n > 0) {
        body["max_tokens"] = json!(max_tokens);
    }
    body
}

/// Parse a response body, turning error objects and failed statuses into errors
pub(crate) fn parse_response(status: u16, text: &str) -> Result<Value> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) if (200..300).contains(&status) => {
            return Err(LlamaError::malformed(format!("response is not JSON: {err}")));
        }
        Err(_) => {
            return Err(LlamaError::Server {
                code: i64::from(status),
                message: text.trim().to_string(),
            });
        }
    };

    if let Some(error) = value.get("error") {
        let code = error
            .get("code")
            .and_then(Value::as_i64)
            .unwrap_or_else(|| i64::from(status));
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(LlamaError::Server { code, message });
    }
    if !(200..300).contains(&status) {
        return Err(LlamaError::Server {
            code: i64::from(status),
            message: text.trim().to_string(),
        });
    }
    Ok(value)
}

/// `data[0].embedding`
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn extract_embedding(value: &Value) -> Result<Vec<f32>> {
    let values = value
        .pointer("/data/0/embedding")
        .and_then(Value::as_array)
        .ok_or_else(|| LlamaError::malformed("missing data[0].embedding"))?;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| LlamaError::malformed(format!("embedding[{i}] is not a number")))
        })
        .collect()
}

/// `choices[0].message.content`
pub(crate) fn extract_chat_content(value: &Value) -> Result<String> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlamaError::malformed("missing choices[0].message.content"))
}
