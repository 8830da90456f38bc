//! # Basic question answering
//!
//! Indexes two small documents and asks a question, using a deterministic
//! hash-based embedder and an echoing answer assembler so it runs with
//! **zero API keys**.
//!
//! Run: `cargo run -p docqa-rag --example basic_qa`

use std::sync::Arc;

use async_trait::async_trait;
use docqa_rag::{AnswerAssembler, Chunker, EmbeddingProvider, RetrievalEngine, SentenceChunker};

struct HashEmbedder {
    dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        // Bag of words: each lowercase word bumps one hashed bucket.
        let mut v = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            v[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

struct EchoAssembler;

#[async_trait]
impl AnswerAssembler for EchoAssembler {
    async fn complete(
        &self,
        _system_instruction: &str,
        context: &str,
        question: &str,
    ) -> docqa_rag::Result<String> {
        let first = context.split("\n\n").next().unwrap_or_default();
        Ok(format!("Q: {question}\nBest passage: {first}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let engine = RetrievalEngine::builder()
        .embedding_provider(Arc::new(HashEmbedder { dimensions: 64 }))
        .answer_assembler(Arc::new(EchoAssembler))
        .build()?;

    let chunker = SentenceChunker::new(80);
    let manual = "The router restarts when the reset button is held for ten seconds. \
                  Firmware updates are downloaded automatically every night. \
                  The status light turns amber when the uplink is lost.";
    let warranty = "The warranty covers hardware faults for two years. \
                    Water damage is not covered by the warranty.";

    engine.index_document("manual", &chunker.chunk(manual)).await?;
    engine.index_document("warranty", &chunker.chunk(warranty)).await?;

    let answer = engine.answer_query("How do I reset the router?", 2).await?;
    println!("{}", answer.answer);
    println!("confidence: {:.3}", answer.confidence);
    for chunk in &answer.context_used {
        println!("  [{}] {}", chunk.doc_id, chunk.text);
    }

    Ok(())
}
