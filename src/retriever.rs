//! Query-by-text retrieval over a loaded vector index.
//!
//! Embeds the query with the same model the index was built with and runs a
//! top-k nearest-neighbor search. Read-only; one retriever per index, many
//! queries.

use anyhow::Result;

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::CoreError;
use crate::index::VectorIndex;
use crate::models::ScoredChunk;

pub struct Retriever {
    index: VectorIndex,
    provider: Box<dyn EmbeddingProvider>,
    embedding_config: crate::config::EmbeddingConfig,
    top_k: usize,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("index", &self.index)
            .field("embedding_config", &self.embedding_config)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    /// Wrap a loaded index. Fails if the configured embedding model or its
    /// dimensionality does not match what the index was built with.
    pub fn new(index: VectorIndex, config: &Config) -> Result<Self> {
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

        Ok(Self {
            index,
            provider,
            embedding_config: config.embedding.clone(),
            top_k: config.retrieval.top_k,
        })
    }

    /// Embed `text` and return up to `top_k` chunks by ascending distance.
    ///
    /// An empty query string is embedded like any other text and returns the
    /// index's nearest entries rather than raising.
    pub async fn query(&self, text: &str) -> Result<Vec<ScoredChunk>> {
        let query_vec = embedding::embed_query(self.provider.as_ref(), &self.embedding_config, text)
            .await
            .map_err(|e| CoreError::Embedding(e.to_string()))?;

        Ok(self.index.search(&query_vec, self.top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;
    use crate::models::Chunk;

    fn hashed_config(top_k: usize) -> Config {
        let mut config = Config::default();
        config.embedding.provider = "hashed".to_string();
        config.embedding.dims = Some(32);
        config.retrieval.top_k = top_k;
        config
    }

    fn chunk(text: &str, path: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_path: path.to_string(),
            sequence_index: 0,
        }
    }

    async fn retriever_over(texts: &[(&str, &str)], top_k: usize) -> Retriever {
        let config = hashed_config(top_k);
        let chunks = texts.iter().map(|(t, p)| chunk(t, p)).collect();
        let index = build_index(chunks, &config).await.unwrap();
        Retriever::new(index, &config).unwrap()
    }

    #[tokio::test]
    async fn test_query_returns_top_k() {
        let retriever = retriever_over(
            &[
                ("alpha text", "a.rs"),
                ("beta text", "b.rs"),
                ("gamma text", "c.rs"),
                ("delta text", "d.rs"),
            ],
            2,
        )
        .await;

        let results = retriever.query("alpha text").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.source_path, "a.rs");
        assert!(results[0].distance <= results[1].distance);
    }

    #[tokio::test]
    async fn test_small_index_returns_everything() {
        let retriever = retriever_over(&[("only entry", "x.rs")], 5).await;
        let results = retriever.query("anything").await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_query_tolerated() {
        let retriever = retriever_over(&[("one", "a.rs"), ("two", "b.rs")], 5).await;
        let results = retriever.query("").await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_mismatched_dims_rejected() {
        let mut config = hashed_config(5);
        config.embedding.dims = Some(64);
        let chunks = vec![
            chunk("a recipe for cooking", "a.rs"),
            chunk("fn parse() {}", "b.rs"),
        ];
        let index = build_index(chunks, &config).await.unwrap();

        config.embedding.dims = Some(32);
        let err = Retriever::new(index, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::DimsMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_mismatched_model_rejected() {
        let config = hashed_config(5);
        let index = crate::index::VectorIndex::new("all-minilm-l6-v2".to_string(), 32, Vec::new());
        let err = Retriever::new(index, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::ModelMismatch { .. })
        ));
    }
}
