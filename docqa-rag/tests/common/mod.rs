//! Test doubles for the embedding provider and answer assembler.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docqa_rag::{AnswerAssembler, EmbeddingProvider, RagError, Result};

/// Embeds texts by table lookup. Unknown texts map to the zero vector.
pub struct TableEmbedder {
    dimensions: usize,
    table: HashMap<String, Vec<f32>>,
    fail_on: Option<String>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl TableEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            table: HashMap::new(),
            fail_on: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }

    /// Fail with a provider error whenever `text` is embedded.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on = Some(text.to_string());
        self
    }

    /// Sleep before every embedding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.as_deref() == Some(text) {
            return Err(RagError::EmbeddingError {
                provider: "table".into(),
                message: format!("quota exceeded embedding '{text}'"),
            });
        }
        Ok(self.table.get(text).cloned().unwrap_or_else(|| vec![0.0; self.dimensions]))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// One recorded call to [`RecordingAssembler::complete`].
#[derive(Debug, Clone)]
pub struct Completion {
    pub system_instruction: String,
    pub context: String,
    pub question: String,
}

/// Returns a fixed answer and records every call.
pub struct RecordingAssembler {
    answer: String,
    fail: bool,
    pub completions: Mutex<Vec<Completion>>,
}

impl RecordingAssembler {
    pub fn new(answer: &str) -> Self {
        Self { answer: answer.to_string(), fail: false, completions: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { answer: String::new(), fail: true, completions: Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.completions.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Completion> {
        self.completions.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AnswerAssembler for RecordingAssembler {
    async fn complete(
        &self,
        system_instruction: &str,
        context: &str,
        question: &str,
    ) -> Result<String> {
        self.completions.lock().unwrap().push(Completion {
            system_instruction: system_instruction.to_string(),
            context: context.to_string(),
            question: question.to_string(),
        });
        if self.fail {
            return Err(RagError::GenerationError {
                provider: "recording".into(),
                message: "model overloaded".into(),
            });
        }
        Ok(self.answer.clone())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub fn chunks(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}
