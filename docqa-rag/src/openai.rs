//! OpenAI embedding provider and chat answer assembler.
//!
//! Both call the OpenAI HTTP API (or any compatible server) directly with
//! `reqwest`. This module is only available when the `openai` feature is
//! enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::AnswerAssembler;

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The default model for OpenAI embeddings.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// The dimensionality of `text-embedding-ada-002`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// The most inputs the embeddings endpoint accepts in one request.
pub const MAX_EMBEDDING_INPUTS: usize = 2048;

/// The default chat model used to answer questions.
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 500;

const PROVIDER: &str = "OpenAI";

fn api_key_from_env() -> std::result::Result<String, String> {
    std::env::var("OPENAI_API_KEY")
        .map_err(|_| "OPENAI_API_KEY environment variable not set".to_string())
}

fn embedding_error(message: impl Into<String>) -> RagError {
    RagError::EmbeddingError { provider: PROVIDER.into(), message: message.into() }
}

fn generation_error(message: impl Into<String>) -> RagError {
    RagError::GenerationError { provider: PROVIDER.into(), message: message.into() }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a non-2xx response into the API's error message, falling back to
/// the raw body.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Configuration
///
/// - `model` – defaults to `text-embedding-ada-002` (1536 dimensions).
/// - `dimensions` – optional output size, sent with every request.
/// - `batch_size` – inputs per request, at most [`MAX_EMBEDDING_INPUTS`] by
///   default. Larger batches are split and the results concatenated in order.
/// - `base_url` – defaults to [`OPENAI_API_BASE`]; point it at any
///   OpenAI-compatible server.
/// - `api_key` – from the constructor or the `OPENAI_API_KEY` environment variable.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    request_dimensions: Option<usize>,
    batch_size: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(embedding_error("API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
            batch_size: MAX_EMBEDDING_INPUTS,
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env().map_err(embedding_error)?)
    }

    /// Set the model name. Pair with [`with_dimensions`](Self::with_dimensions)
    /// when the model's output size differs from 1536.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Ask the model for vectors of `dims` dimensions.
    ///
    /// The size is sent as the request's `dimensions` field, which only the
    /// `text-embedding-3-*` family honours.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    /// Set how many inputs go into a single request. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the API base URL, without a trailing slash.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send one `/embeddings` request and return its vectors in input order.
    async fn request_embeddings(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.request_dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                embedding_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, %message, "API error");
            return Err(embedding_error(message));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            embedding_error(format!("failed to parse response: {e}"))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(embedding_error(format!(
                "expected {} embeddings, API returned {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| embedding_error("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.request_embeddings(batch).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// An [`AnswerAssembler`] backed by the OpenAI chat completions API.
///
/// Sends the system instruction as a system message and a single user
/// message holding the context and the question.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::openai::OpenAIAnswerAssembler;
///
/// let assembler = OpenAIAnswerAssembler::from_env()?.with_model("gpt-4o-mini");
/// ```
pub struct OpenAIAnswerAssembler {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAIAnswerAssembler {
    /// Create a new assembler with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(generation_error("API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_CHAT_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Create a new assembler using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::new(api_key_from_env().map_err(generation_error)?)
    }

    /// Set the chat model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL, without a trailing slash.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of tokens in the answer.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Build the user message holding the retrieved context and the question.
pub fn user_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based on the following context. If the context doesn't contain \
         enough information to answer the question confidently, say so.\n\n\
         Context:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl AnswerAssembler for OpenAIAnswerAssembler {
    async fn complete(
        &self,
        system_instruction: &str,
        context: &str,
        question: &str,
    ) -> Result<String> {
        let prompt = user_prompt(context, question);
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "requesting answer");

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system_instruction },
                ChatMessage { role: "user", content: &prompt },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                generation_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, %message, "API error");
            return Err(generation_error(message));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            generation_error(format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| generation_error("API returned no answer"))
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
