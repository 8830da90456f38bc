//! HTTP surface for document question answering.
//!
//! Text arrives already extracted; [`server::app_router`] chunks and indexes
//! it, and answers questions through a shared
//! [`RetrievalEngine`](docqa_rag::RetrievalEngine).

pub mod config;
pub mod error;
pub mod server;

pub use config::ServerConfig;
pub use error::ApiError;
pub use server::{AppState, app_router, build_engine, run_server};
