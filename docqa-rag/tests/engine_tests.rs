//! Behavioural tests for indexing and question answering.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{RecordingAssembler, TableEmbedder, chunks};
use docqa_rag::{
    ChunkRef, DocumentStore, EngineConfig, FALLBACK_ANSWER, FlatL2Index, RagError,
    RetrievalEngine, SYSTEM_INSTRUCTION,
};

fn engine(
    embedder: TableEmbedder,
    assembler: Arc<RecordingAssembler>,
    config: EngineConfig,
) -> RetrievalEngine {
    RetrievalEngine::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .answer_assembler(assembler)
        .build()
        .unwrap()
}

/// Three chunks whose squared distances to the zero query are 0.1, 0.2 and 0.4.
fn graded_embedder() -> TableEmbedder {
    TableEmbedder::new(2)
        .with("near", vec![0.1f32.sqrt(), 0.0])
        .with("mid", vec![0.0, 0.2f32.sqrt()])
        .with("far", vec![0.4f32.sqrt(), 0.0])
        .with("question", vec![0.0, 0.0])
}

#[tokio::test]
async fn indexed_chunks_resolve_to_their_document_position() {
    let assembler = Arc::new(RecordingAssembler::new("unused"));
    let engine = engine(TableEmbedder::new(2), assembler, EngineConfig::default());

    engine.index_document("first", &chunks(&["a", "b"])).await.unwrap();
    let positions = engine.index_document("second", &chunks(&["c", "d", "e"])).await.unwrap();

    assert_eq!(positions, Some(2..5));
    assert_eq!(engine.len().await, 5);
    for (i, position) in (2..5).enumerate() {
        assert_eq!(
            engine.resolve(position).await,
            Some(ChunkRef { doc_id: "second".into(), chunk_index: i })
        );
    }
    assert_eq!(engine.document_positions("first").await, vec![0, 1]);
}

#[tokio::test]
async fn empty_document_is_not_registered() {
    let embedder = TableEmbedder::new(2);
    let assembler = Arc::new(RecordingAssembler::new("unused"));
    let engine = engine(embedder, assembler, EngineConfig::default());

    let positions = engine.index_document("blank", &[]).await.unwrap();

    assert_eq!(positions, None);
    assert!(engine.is_empty().await);
    assert!(!engine.contains_document("blank").await);
}

#[tokio::test]
async fn reindexing_appends_duplicate_entries() {
    let assembler = Arc::new(RecordingAssembler::new("unused"));
    let engine = engine(TableEmbedder::new(2), assembler, EngineConfig::default());
    let doc = chunks(&["one", "two"]);

    engine.index_document("doc", &doc).await.unwrap();
    engine.index_document("doc", &doc).await.unwrap();

    assert_eq!(engine.len().await, 4);
    assert_eq!(engine.document_positions("doc").await, vec![0, 1, 2, 3]);
    assert_eq!(engine.resolve(2).await, Some(ChunkRef { doc_id: "doc".into(), chunk_index: 0 }));
}

#[tokio::test]
async fn empty_index_returns_fallback_without_generation() {
    let assembler = Arc::new(RecordingAssembler::new("should not be used"));
    let engine = engine(TableEmbedder::new(2), assembler.clone(), EngineConfig::default());

    let answer = engine.answer_query("anything?", 3).await.unwrap();

    assert_eq!(answer.answer, FALLBACK_ANSWER);
    assert!(answer.context_used.is_empty());
    assert_eq!(answer.confidence, 0.0);
    assert_eq!(assembler.call_count(), 0);
}

#[tokio::test]
async fn selects_nearest_chunks_and_scores_confidence() {
    let assembler = Arc::new(RecordingAssembler::new("Paris"));
    let engine = engine(graded_embedder(), assembler.clone(), EngineConfig::default());
    engine.index_document("doc", &chunks(&["far", "near", "mid"])).await.unwrap();

    let answer = engine.answer_query("question", 2).await.unwrap();

    assert_eq!(answer.answer, "Paris");
    let texts: Vec<_> = answer.context_used.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["near", "mid"]);
    assert!(answer.context_used.iter().all(|c| c.doc_id == "doc"));
    assert!((answer.confidence - 0.95).abs() < 1e-6, "confidence was {}", answer.confidence);

    let call = assembler.last().unwrap();
    assert_eq!(call.context, "near\n\nmid");
    assert_eq!(call.question, "question");
    assert_eq!(call.system_instruction, SYSTEM_INSTRUCTION);
}

#[tokio::test]
async fn zero_context_chunks_is_treated_as_no_context() {
    let embedder = graded_embedder();
    let assembler = Arc::new(RecordingAssembler::new("unused"));
    let engine = engine(embedder, assembler.clone(), EngineConfig::default());
    engine.index_document("doc", &chunks(&["near"])).await.unwrap();

    let answer = engine.answer_query("question", 0).await.unwrap();

    assert_eq!(answer.answer, FALLBACK_ANSWER);
    assert!(!answer.has_context());
    assert_eq!(answer.confidence, 0.0);
    assert_eq!(assembler.call_count(), 0);
}

#[tokio::test]
async fn zero_context_chunks_still_embeds_the_question() {
    let embedder = graded_embedder().failing_on("question");
    let assembler = Arc::new(RecordingAssembler::new("unused"));
    let engine = engine(embedder, assembler.clone(), EngineConfig::default());
    engine.index_document("doc", &chunks(&["near"])).await.unwrap();

    let err = engine.answer_query("question", 0).await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert_eq!(assembler.call_count(), 0);
}

#[tokio::test]
async fn unbounded_context_limit_returns_every_chunk_once() {
    let assembler = Arc::new(RecordingAssembler::new("ok"));
    let engine = engine(graded_embedder(), assembler.clone(), EngineConfig::default());
    engine.index_document("doc", &chunks(&["near"])).await.unwrap();

    let limit = docqa_rag::context_limit(i64::MAX).unwrap();
    let answer = engine.answer_query("question", limit).await.unwrap();
    assert_eq!(answer.context_used.len(), 1);
    assert_eq!(answer.context_used[0].text, "near");

    let answer = engine.answer_query("question", usize::MAX).await.unwrap();
    assert_eq!(answer.context_used.len(), 1);
    assert_eq!(assembler.call_count(), 2);
}

#[tokio::test]
async fn under_full_index_returns_what_it_has() {
    let assembler = Arc::new(RecordingAssembler::new("ok"));
    let engine = engine(graded_embedder(), assembler, EngineConfig::default());
    engine.index_document("doc", &chunks(&["mid"])).await.unwrap();

    let answer = engine.answer_query("question", 10).await.unwrap();

    assert_eq!(answer.context_used.len(), 1);
    assert!((answer.confidence - 0.9).abs() < 1e-6);
}

#[tokio::test]
async fn embedding_failure_commits_nothing() {
    let embedder = TableEmbedder::new(2).failing_on("bad");
    let assembler = Arc::new(RecordingAssembler::new("unused"));
    let engine = engine(embedder, assembler, EngineConfig::default());
    engine.index_document("ok", &chunks(&["fine"])).await.unwrap();

    let err = engine.index_document("broken", &chunks(&["good", "bad", "good"])).await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert_eq!(engine.len().await, 1);
    assert!(!engine.contains_document("broken").await);
}

#[tokio::test]
async fn wrong_dimension_from_provider_is_rejected() {
    let embedder = TableEmbedder::new(2).with("odd", vec![1.0, 2.0, 3.0]);
    let assembler = Arc::new(RecordingAssembler::new("unused"));
    let engine = engine(embedder, assembler, EngineConfig::default());

    let err = engine.index_document("doc", &chunks(&["fine", "odd"])).await.unwrap_err();

    assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));
    assert!(engine.is_empty().await);
}

#[tokio::test]
async fn query_embedding_failure_aborts_the_question() {
    let embedder = graded_embedder().failing_on("question");
    let assembler = Arc::new(RecordingAssembler::new("unused"));
    let engine = engine(embedder, assembler.clone(), EngineConfig::default());
    engine.index_document("doc", &chunks(&["near"])).await.unwrap();

    let err = engine.answer_query("question", 3).await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert_eq!(assembler.call_count(), 0);
}

#[tokio::test]
async fn generation_failure_is_surfaced() {
    let assembler = Arc::new(RecordingAssembler::failing());
    let engine = engine(graded_embedder(), assembler, EngineConfig::default());
    engine.index_document("doc", &chunks(&["near"])).await.unwrap();

    let err = engine.answer_query("question", 1).await.unwrap_err();

    assert!(matches!(err, RagError::GenerationError { .. }));
    assert!(err.to_string().contains("model overloaded"));
}

#[tokio::test]
async fn confidence_is_negative_for_distant_chunks_unless_clamped() {
    let embedder = || TableEmbedder::new(1).with("remote", vec![3.0]).with("q", vec![0.0]);

    let raw = engine(embedder(), Arc::new(RecordingAssembler::new("a")), EngineConfig::default());
    raw.index_document("doc", &chunks(&["remote"])).await.unwrap();
    assert_eq!(raw.answer_query("q", 1).await.unwrap().confidence, -3.5);

    let config = EngineConfig::builder().clamp_confidence(true).build().unwrap();
    let clamped = engine(embedder(), Arc::new(RecordingAssembler::new("a")), config);
    clamped.index_document("doc", &chunks(&["remote"])).await.unwrap();
    assert_eq!(clamped.answer_query("q", 1).await.unwrap().confidence, 0.0);
}

#[tokio::test]
async fn default_context_size_comes_from_config() {
    let config = EngineConfig::builder().max_context_chunks(1).build().unwrap();
    let assembler = Arc::new(RecordingAssembler::new("ok"));
    let engine = engine(graded_embedder(), assembler, config);
    engine.index_document("doc", &chunks(&["near", "mid", "far"])).await.unwrap();

    let answer = engine.answer("question").await.unwrap();

    assert_eq!(answer.context_used.len(), 1);
    assert_eq!(answer.context_used[0].text, "near");
}

#[tokio::test(start_paused = true)]
async fn slow_embedding_times_out_without_committing() {
    let embedder = TableEmbedder::new(2).with_delay(Duration::from_secs(30));
    let config =
        EngineConfig::builder().embedding_timeout(Duration::from_secs(1)).build().unwrap();
    let engine = engine(embedder, Arc::new(RecordingAssembler::new("unused")), config);

    let err = engine.index_document("doc", &chunks(&["slow"])).await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingError { .. }));
    assert!(err.to_string().contains("timed out"));
    assert!(engine.is_empty().await);
}

#[tokio::test]
async fn chunks_are_embedded_once_each() {
    let embedder = Arc::new(TableEmbedder::new(2));
    let engine = RetrievalEngine::builder()
        .embedding_provider(embedder.clone())
        .answer_assembler(Arc::new(RecordingAssembler::new("unused")))
        .build()
        .unwrap();

    engine.index_document("doc", &chunks(&["a", "b", "c"])).await.unwrap();

    assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn concurrent_indexing_keeps_documents_contiguous() {
    let engine = Arc::new(engine(
        TableEmbedder::new(2),
        Arc::new(RecordingAssembler::new("unused")),
        EngineConfig::default(),
    ));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let doc = chunks(&["x", "y", "z"]);
                engine.index_document(&format!("doc-{i}"), &doc).await.unwrap()
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(engine.len().await, 24);
    for i in 0..8 {
        let positions = engine.document_positions(&format!("doc-{i}")).await;
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[1], positions[0] + 1);
        assert_eq!(positions[2], positions[0] + 2);
    }
}

#[test]
fn builder_requires_providers() {
    let err = RetrievalEngine::builder().build().unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}

#[test]
fn builder_rejects_store_of_other_dimension() {
    let err = RetrievalEngine::builder()
        .embedding_provider(Arc::new(TableEmbedder::new(4)))
        .answer_assembler(Arc::new(RecordingAssembler::new("unused")))
        .store(DocumentStore::new(FlatL2Index::new(8).unwrap()).unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(err, RagError::ConfigError(_)));
}
