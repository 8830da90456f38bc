//! Naive sentence-based chunking for plain text.
//!
//! Segmentation sits upstream of the retrieval core: the engine accepts any
//! ordered list of chunk texts. [`SentenceChunker`] is the simple policy the
//! HTTP glue uses for uploaded text.

/// A strategy for splitting extracted document text into chunks.
pub trait Chunker: Send + Sync {
    /// Split `text` into ordered chunks.
    ///
    /// Returns an empty `Vec` if the text contains nothing to index.
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Greedily packs `.`-terminated sentences into chunks of at most
/// `chunk_size` characters.
///
/// Line breaks are treated as spaces. A single sentence longer than
/// `chunk_size` becomes its own oversized chunk rather than being cut.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{Chunker, SentenceChunker};
///
/// let chunks = SentenceChunker::new(1000).chunk(&extracted_text);
/// ```
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
}

impl SentenceChunker {
    /// The chunk size used when none is configured.
    pub const DEFAULT_CHUNK_SIZE: usize = 1000;

    /// Create a new `SentenceChunker` emitting chunks of at most
    /// `chunk_size` characters.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHUNK_SIZE)
    }
}

fn push_trimmed(chunks: &mut Vec<String>, current: &str) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let flattened = text.replace(['\r', '\n'], " ");
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for sentence in flattened.split('.') {
            if sentence.trim().is_empty() {
                continue;
            }
            let sentence_len = sentence.chars().count();
            if current_len + sentence_len > self.chunk_size {
                push_trimmed(&mut chunks, &current);
                current.clear();
                current_len = 0;
            }
            current.push_str(sentence);
            current.push('.');
            current_len += sentence_len + 1;
        }
        push_trimmed(&mut chunks, &current);

        chunks
    }
}
