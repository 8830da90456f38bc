//! Answer assembler trait for the generative half of question answering.

use async_trait::async_trait;

use crate::error::Result;

/// A generative model that answers a question from retrieved context.
///
/// The engine calls [`complete`](AnswerAssembler::complete) at most once per
/// question, and never when retrieval produced no context.
#[async_trait]
pub trait AnswerAssembler: Send + Sync {
    /// Produce a free-text answer to `question` grounded in `context`.
    ///
    /// `context` is the retrieved chunk texts joined by blank lines, nearest
    /// chunk first.
    async fn complete(
        &self,
        system_instruction: &str,
        context: &str,
        question: &str,
    ) -> Result<String>;

    /// A short name used in logs and error messages.
    fn name(&self) -> &str {
        "generation"
    }
}
