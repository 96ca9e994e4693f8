use anyhow::{Context, Result};
use clap::ValueEnum;
use mrag_text_chunker::ChunkerConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "mrag.toml";
pub const DEFAULT_ROOT: &str = "vectors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// llama.cpp servers from the config
    #[default]
    Llama,
    /// Deterministic offline providers
    Stub,
}

impl EmbeddingMode {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "llama" => Ok(Self::Llama),
            "stub" => Ok(Self::Stub),
            other => anyhow::bail!(
                "Unsupported MRAG_EMBEDDING_MODE '{other}' (expected 'llama' or 'stub')"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Directory holding the group files
    pub root: PathBuf,
    pub chunking: ChunkerConfig,
    pub embedding_servers: Vec<String>,
    pub chat_servers: Vec<String>,
    pub embedding_model: String,
    pub health_check_interval_secs: u64,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub embedding_mode: EmbeddingMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            chunking: ChunkerConfig::default(),
            embedding_servers: vec!["http://127.0.0.1:8080".to_string()],
            chat_servers: vec!["http://127.0.0.1:8081".to_string()],
            embedding_model: mrag_llama::DEFAULT_EMBEDDING_MODEL.to_string(),
            health_check_interval_secs: mrag_llama::DEFAULT_HEALTH_CHECK_INTERVAL.as_secs(),
            temperature: None,
            max_tokens: None,
            embedding_mode: EmbeddingMode::default(),
        }
    }
}

impl AppConfig {
    /// Read `path`, or `mrag.toml` in the working directory when present,
    /// then apply `MRAG_*` overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(root) = var("MRAG_ROOT") {
            self.root = PathBuf::from(root);
        }
        if let Some(size) = var("MRAG_CHUNK_SIZE") {
            self.chunking.chunk_size = parse_number("MRAG_CHUNK_SIZE", &size)?;
        }
        if let Some(size) = var("MRAG_OVERLAP_SIZE") {
            self.chunking.overlap_size = parse_number("MRAG_OVERLAP_SIZE", &size)?;
        }
        if let Some(list) = var("MRAG_EMBEDDING_SERVERS") {
            self.embedding_servers = split_list(&list);
        }
        if let Some(list) = var("MRAG_CHAT_SERVERS") {
            self.chat_servers = split_list(&list);
        }
        if let Some(model) = var("MRAG_EMBEDDING_MODEL") {
            self.embedding_model = model;
        }
        if let Some(secs) = var("MRAG_HEALTH_CHECK_INTERVAL_SECS") {
            self.health_check_interval_secs =
                parse_number("MRAG_HEALTH_CHECK_INTERVAL_SECS", &secs)?;
        }
        if let Some(temperature) = var("MRAG_TEMPERATURE") {
            self.temperature = Some(parse_number("MRAG_TEMPERATURE", &temperature)?);
        }
        if let Some(tokens) = var("MRAG_MAX_TOKENS") {
            self.max_tokens = Some(parse_number("MRAG_MAX_TOKENS", &tokens)?);
        }
        if let Some(mode) = var("MRAG_EMBEDDING_MODE") {
            self.embedding_mode = EmbeddingMode::parse(&mode)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking
            .validate()
            .context("Invalid [chunking] settings")?;
        if self.embedding_mode == EmbeddingMode::Llama {
            anyhow::ensure!(
                !self.embedding_servers.is_empty(),
                "embedding_servers must list at least one server"
            );
            anyhow::ensure!(
                !self.chat_servers.is_empty(),
                "chat_servers must list at least one server"
            );
            anyhow::ensure!(
                !self.embedding_model.trim().is_empty(),
                "embedding_model must not be empty"
            );
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err| anyhow::anyhow!("Invalid {key} '{raw}': {err}"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
