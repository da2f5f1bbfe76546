//! Core data models used throughout bugscope.
//!
//! These types represent the documents, chunks, and retrieval results that
//! flow through the indexing and query pipeline.

/// A source file loaded from a repository snapshot.
///
/// Produced by the loader, consumed by the chunker, and discarded afterwards.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path relative to the repository root. Unique within one load.
    pub path: String,
    /// Full file text.
    pub content: String,
}

/// A bounded contiguous piece of a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Relative path of the file this chunk was cut from.
    pub source_path: String,
    /// Position among the chunks derived from the same file.
    pub sequence_index: usize,
}

/// A chunk paired with its embedding vector, stored in the index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

/// A chunk returned from a nearest-neighbor query, with its cosine distance
/// to the query vector. Lower distance means more relevant.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

/// Merged retrieval context for one source file.
///
/// `merged_text` joins that file's retrieved chunk texts, in result order,
/// with the `"\n...\n"` separator.
#[derive(Debug, Clone, PartialEq)]
pub struct FileContext {
    pub path: String,
    pub merged_text: String,
}
