//! Server configuration read from the environment.

use std::time::Duration;

use anyhow::{Context, Result};
use docqa_rag::{EngineConfig, SentenceChunker};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Runtime settings for the HTTP server and the engine behind it.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum characters per chunk for uploaded text.
    pub chunk_size: usize,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
    /// Whole-request deadline, including provider calls.
    pub request_timeout: Duration,
    /// Override for `OPENAI_BASE_URL`-style compatible servers.
    pub openai_base_url: Option<String>,
    pub embedding_model: Option<String>,
    /// Required alongside `embedding_model` when the model is not 1536-dimensional.
    pub embedding_dimensions: Option<usize>,
    pub chat_model: Option<String>,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            chunk_size: SentenceChunker::DEFAULT_CHUNK_SIZE,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            openai_base_url: None,
            embedding_model: None,
            embedding_dimensions: None,
            chat_model: None,
            engine: EngineConfig::default(),
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|value| {
            value.parse::<T>().with_context(|| format!("invalid value for {key}: '{value}'"))
        })
        .transpose()
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let mut engine = EngineConfig::builder()
            .max_context_chunks(
                parse(&lookup, "DOCQA_MAX_CONTEXT_CHUNKS")?
                    .unwrap_or(defaults.engine.max_context_chunks),
            )
            .clamp_confidence(
                parse(&lookup, "DOCQA_CLAMP_CONFIDENCE")?
                    .unwrap_or(defaults.engine.clamp_confidence),
            );
        if let Some(secs) = parse::<u64>(&lookup, "DOCQA_EMBEDDING_TIMEOUT_SECS")? {
            engine = engine.embedding_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = parse::<u64>(&lookup, "DOCQA_GENERATION_TIMEOUT_SECS")? {
            engine = engine.generation_timeout(Duration::from_secs(secs));
        }
        let engine = engine.build().context("invalid engine configuration")?;

        let chunk_size = parse(&lookup, "DOCQA_CHUNK_SIZE")?.unwrap_or(defaults.chunk_size);
        if chunk_size == 0 {
            anyhow::bail!("DOCQA_CHUNK_SIZE must be greater than zero");
        }

        Ok(Self {
            host: lookup("DOCQA_HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "DOCQA_PORT")?.unwrap_or(defaults.port),
            chunk_size,
            max_body_bytes: parse(&lookup, "DOCQA_MAX_BODY_BYTES")?
                .unwrap_or(defaults.max_body_bytes),
            request_timeout: parse(&lookup, "DOCQA_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            openai_base_url: lookup("OPENAI_BASE_URL"),
            embedding_model: lookup("DOCQA_EMBEDDING_MODEL"),
            embedding_dimensions: parse(&lookup, "DOCQA_EMBEDDING_DIMENSIONS")?,
            chat_model: lookup("DOCQA_CHAT_MODEL"),
            engine,
        })
    }
}
