use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, post},
};
use docqa_rag::{
    Answer, Chunker, RetrievalEngine, SentenceChunker, context_limit,
    openai::{OpenAIAnswerAssembler, OpenAIEmbeddingProvider},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{config::ServerConfig, error::ApiError};

/// Detail returned when retrieval found nothing to answer from.
pub const NO_CONTEXT_DETAIL: &str = "No context available";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RetrievalEngine>,
    pub chunker: Arc<dyn Chunker>,
}

impl AppState {
    pub fn new(engine: Arc<RetrievalEngine>, chunk_size: usize) -> Self {
        Self { engine, chunker: Arc::new(SentenceChunker::new(chunk_size)) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub document_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub message: String,
    pub file_id: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub max_context_chunks: Option<i64>,
}

pub fn app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/documents", post(upload_document))
        .route("/question", post(ask_question))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Build an engine backed by the OpenAI API. Reads `OPENAI_API_KEY`.
pub fn build_engine(config: &ServerConfig) -> anyhow::Result<RetrievalEngine> {
    let mut embedder =
        OpenAIEmbeddingProvider::from_env().context("failed to create embedding provider")?;
    let mut assembler =
        OpenAIAnswerAssembler::from_env().context("failed to create answer assembler")?;

    if let Some(base_url) = &config.openai_base_url {
        embedder = embedder.with_base_url(base_url);
        assembler = assembler.with_base_url(base_url);
    }
    if let Some(model) = &config.embedding_model {
        embedder = embedder.with_model(model);
    }
    if let Some(dims) = config.embedding_dimensions {
        embedder = embedder.with_dimensions(dims);
    }
    if let Some(model) = &config.chat_model {
        assembler = assembler.with_model(model);
    }

    RetrievalEngine::builder()
        .config(config.engine.clone())
        .embedding_provider(Arc::new(embedder))
        .answer_assembler(Arc::new(assembler))
        .build()
        .context("failed to build retrieval engine")
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let engine = Arc::new(build_engine(&config)?);
    let app = app_router(AppState::new(engine, config.chunk_size), &config);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for docqa-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("docqa-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to Document QA API" }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn upload_document(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    if request.text.trim().is_empty() {
        return Err(ApiError::bad_request("Document text cannot be empty"));
    }

    let chunks = state.chunker.chunk(&request.text);
    if chunks.is_empty() {
        return Err(ApiError::bad_request("Document contains no indexable text"));
    }

    let doc_id = match request.document_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => Uuid::new_v4().to_string(),
    };

    state.engine.index_document(&doc_id, &chunks).await?;

    Ok(Json(UploadResponse {
        status: "success".to_string(),
        message: "Document processed successfully".to_string(),
        file_id: doc_id,
        chunk_count: chunks.len(),
    }))
}

async fn ask_question(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<Answer>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(ApiError::bad_request("Question cannot be empty"));
    }

    if let Some(doc_id) = &request.document_id {
        if !state.engine.contains_document(doc_id).await {
            return Err(docqa_rag::RagError::UnknownDocument(doc_id.clone()).into());
        }
    }

    let answer = match request.max_context_chunks {
        Some(k) => state.engine.answer_query(&request.question, context_limit(k)?).await?,
        None => state.engine.answer(&request.question).await?,
    };

    if !answer.has_context() {
        warn!("question answered without context");
        return Err(ApiError::not_found(NO_CONTEXT_DETAIL));
    }

    Ok(Json(answer))
}
