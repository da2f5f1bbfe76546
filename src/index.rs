//! Vector index: build, persist, load, and query.
//!
//! The index is an immutable set of (vector, chunk) entries built once per
//! repository snapshot. Queries are exact k-nearest-neighbor by cosine
//! distance with stable insertion-order tie-breaking. Persistence is a
//! single SQLite file; the file's existence is the idempotency signal for
//! skip-if-present builds, and nothing is written until the full embedding
//! pass has succeeded.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::chunk::chunk_documents;
use crate::config::Config;
use crate::embedding;
use crate::error::CoreError;
use crate::loader;
use crate::models::{Chunk, IndexEntry, ScoredChunk};

/// An in-memory vector index over a repository snapshot.
///
/// Read-only after construction; rebuilds require discarding the persisted
/// file first (see [`ensure_index`]).
#[derive(Debug)]
pub struct VectorIndex {
    model_name: String,
    dims: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new(model_name: String, dims: usize, entries: Vec<IndexEntry>) -> Self {
        Self {
            model_name,
            dims,
            entries,
        }
    }

    /// Identifier of the embedding model the index was built with.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact k-nearest-neighbor search by cosine distance.
    ///
    /// Returns up to `k` chunks ordered by ascending distance; ties keep
    /// insertion order. An index smaller than `k` returns everything.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, 1.0 - embedding::cosine_similarity(query, &entry.vector)))
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, distance)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                distance,
            })
            .collect()
    }

    /// Serialize the index to a SQLite file at `path`, replacing any
    /// existing contents in one transaction.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let pool = connect(path, true).await?;
        create_schema(&pool).await?;

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM entries").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM index_meta").execute(&mut *tx).await?;

        sqlx::query(
            "INSERT INTO index_meta (id, model, dims, entry_count, created_at) VALUES (1, ?, ?, ?, ?)",
        )
        .bind(&self.model_name)
        .bind(self.dims as i64)
        .bind(self.entries.len() as i64)
        .bind(chrono::Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        for (pos, entry) in self.entries.iter().enumerate() {
            sqlx::query(
                "INSERT INTO entries (pos, source_path, sequence_index, text, embedding) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(pos as i64)
            .bind(&entry.chunk.source_path)
            .bind(entry.chunk.sequence_index as i64)
            .bind(&entry.chunk.text)
            .bind(embedding::vec_to_blob(&entry.vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        pool.close().await;
        Ok(())
    }

    /// Restore an index from a SQLite file previously written by [`save`].
    ///
    /// Pre- and post-persistence indices answer queries identically.
    ///
    /// [`save`]: VectorIndex::save
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::IndexNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let pool = connect(path, false).await?;

        let meta = sqlx::query("SELECT model, dims FROM index_meta WHERE id = 1")
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!("Index at {} has no metadata (corrupt?)", path.display())
            })?;
        let model_name: String = meta.get("model");
        let dims: i64 = meta.get("dims");

        let rows = sqlx::query(
            "SELECT source_path, sequence_index, text, embedding FROM entries ORDER BY pos",
        )
        .fetch_all(&pool)
        .await?;

        let entries: Vec<IndexEntry> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let sequence_index: i64 = row.get("sequence_index");
                IndexEntry {
                    vector: embedding::blob_to_vec(&blob),
                    chunk: Chunk {
                        text: row.get("text"),
                        source_path: row.get("source_path"),
                        sequence_index: sequence_index as usize,
                    },
                }
            })
            .collect();

        pool.close().await;

        Ok(Self {
            model_name,
            dims: dims as usize,
            entries,
        })
    }
}

/// Embed every chunk (batched, order-preserving) and assemble the index.
///
/// Embedding failures abort the whole build; no partial index results.
pub async fn build_index(chunks: Vec<Chunk>, config: &Config) -> Result<VectorIndex> {
    let provider = embedding::create_provider(&config.embedding)?;
    let model_name = provider.model_name().to_string();

    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(config.embedding.batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let batch_vectors = embedding::embed_texts(provider.as_ref(), &config.embedding, &texts)
            .await
            .map_err(|e| CoreError::Embedding(e.to_string()))?;

        if batch_vectors.len() != batch.len() {
            return Err(CoreError::Embedding(format!(
                "provider returned {} vectors for {} texts",
                batch_vectors.len(),
                batch.len()
            ))
            .into());
        }
        vectors.extend(batch_vectors);
    }

    // Dimension must be constant across the whole index.
    let dims = vectors.first().map(|v| v.len()).unwrap_or(provider.dims());
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        return Err(CoreError::Embedding(format!(
            "inconsistent embedding dimensions: expected {}, got {}",
            dims,
            bad.len()
        ))
        .into());
    }

    let entries = vectors
        .into_iter()
        .zip(chunks)
        .map(|(vector, chunk)| IndexEntry { vector, chunk })
        .collect();

    Ok(VectorIndex::new(model_name, dims, entries))
}

/// Outcome of [`ensure_index`]: whether a build actually ran.
#[derive(Debug)]
pub enum BuildOutcome {
    /// A fresh index was built and persisted.
    Built(VectorIndex),
    /// An index already existed at the storage path; it was loaded instead.
    SkippedExisting(VectorIndex),
}

impl BuildOutcome {
    pub fn into_index(self) -> VectorIndex {
        match self {
            BuildOutcome::Built(index) | BuildOutcome::SkippedExisting(index) => index,
        }
    }
}

/// Build an index over the repository at `repo_root`, or load the one
/// already persisted at `index.path`.
///
/// The build is skipped entirely when the storage path exists, unless
/// `force` is set, in which case the old index is discarded first.
pub async fn ensure_index(config: &Config, repo_root: &Path, force: bool) -> Result<BuildOutcome> {
    let path = &config.index.path;

    if path.exists() && !force {
        println!(
            "Index already exists at {}. Skipping build.",
            path.display()
        );
        let index = load_for_query(config).await?;
        return Ok(BuildOutcome::SkippedExisting(index));
    }

    if path.exists() {
        discard_index(path)?;
    }

    println!("Loading and splitting documents from {}...", repo_root.display());
    let documents = loader::load_documents(repo_root)?;
    let chunks = chunk_documents(&documents, &config.chunking);
    println!(
        "Split {} documents into {} chunks.",
        documents.len(),
        chunks.len()
    );

    let index = build_index(chunks, config).await?;
    index.save(path).await?;
    println!(
        "Indexed {} chunks with model '{}' into {}.",
        index.len(),
        index.model_name(),
        path.display()
    );

    Ok(BuildOutcome::Built(index))
}

/// Load the persisted index and verify it was built with the embedding
/// model the current configuration selects.
pub async fn load_for_query(config: &Config) -> Result<VectorIndex> {
    let index = VectorIndex::load(&config.index.path).await?;

    let provider = embedding::create_provider(&config.embedding)?;
    if index.model_name() != provider.model_name() {
        return Err(CoreError::ModelMismatch {
            built: index.model_name().to_string(),
            configured: provider.model_name().to_string(),
        }
        .into());
    }
    if index.dims() != provider.dims() {
        return Err(CoreError::DimsMismatch {
            built: index.dims(),
            configured: provider.dims(),
        }
        .into());
    }

    Ok(index)
}

/// Remove a persisted index, including SQLite WAL sidecar files.
pub fn discard_index(path: &Path) -> Result<()> {
    std::fs::remove_file(path)
        .with_context(|| format!("Failed to remove old index at {}", path.display()))?;
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        let _ = std::fs::remove_file(Path::new(&sidecar));
    }
    Ok(())
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .create_if_missing(create)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS index_meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            entry_count INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            pos INTEGER PRIMARY KEY,
            source_path TEXT NOT NULL,
            sequence_index INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
