//! Error taxonomy for the retrieval core.
//!
//! File-level read problems are recoverable and reported as warnings by the
//! loader; everything here is fatal to the operation that raised it and is
//! surfaced to the caller unchanged. Retry policy for model/network failures
//! belongs to the caller, not the core.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// No eligible source files under the scan root. Fatal to index builds.
    #[error("no processable source files found under {root}")]
    NoSourceFilesFound { root: PathBuf },

    /// A load was attempted against a storage path that does not exist.
    #[error("vector index not found at {path} (run `bugscope index build` first)")]
    IndexNotFound { path: PathBuf },

    /// The index on disk was built with a different embedding model than the
    /// one currently configured. Distances across models are meaningless.
    #[error("index was built with embedding model '{built}' but '{configured}' is configured")]
    ModelMismatch { built: String, configured: String },

    /// The index stores vectors of a different dimensionality than the
    /// configured provider produces. Cosine distance between vectors of
    /// different lengths is undefined.
    #[error("index stores {built}-dimensional vectors but the configured provider produces {configured}")]
    DimsMismatch { built: usize, configured: usize },

    /// The underlying embedding computation failed. Not retried here.
    #[error("embedding failed: {0}")]
    Embedding(String),
}
