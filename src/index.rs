//! In-memory semantic index over file contents.
//!
//! One chunk per distinct non-empty text, keyed by the SHA-256 of its
//! content. Built once per run and never mutated afterwards, so queries need
//! no locking. Search is brute-force cosine similarity; equal scores keep
//! insertion order.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::EmbeddingConfig;
use crate::embedding::{cosine_similarity, Embedder};
use crate::error::{DocError, EmptyCorpusReason, Result};
use crate::prompt::truncate_chars;

/// A text unit stored in the index.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Hex SHA-256 of `text`.
    pub hash: String,
    pub text: String,
}

/// A query hit.
#[derive(Debug, Clone)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

#[derive(Debug)]
pub struct CorpusIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dims: usize,
}

impl CorpusIndex {
    /// Embed `texts` and build the index.
    ///
    /// Empty (whitespace-only) texts are skipped and duplicates collapse to
    /// their first occurrence. Fails with [`DocError::EmptyCorpus`] when
    /// nothing remains.
    pub async fn build(
        embedder: &dyn Embedder,
        config: &EmbeddingConfig,
        texts: &[&str],
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut chunks = Vec::new();
        for text in texts {
            if text.trim().is_empty() {
                continue;
            }
            let hash = content_hash(text);
            if seen.insert(hash.clone()) {
                chunks.push(Chunk {
                    hash,
                    text: text.to_string(),
                });
            }
        }

        if chunks.is_empty() {
            return Err(DocError::EmptyCorpus(EmptyCorpusReason::AllFilesEmpty));
        }
        if chunks.len() < texts.len() {
            debug!(
                distinct = chunks.len(),
                total = texts.len(),
                "collapsed empty or duplicate texts"
            );
        }

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(config.batch_size.max(1)) {
            let inputs: Vec<String> = batch
                .iter()
                .map(|c| truncate_chars(&c.text, config.max_chars).to_string())
                .collect();
            let embedded = embedder
                .embed(&inputs)
                .await
                .map_err(|e| DocError::generation("embedding failed", e))?;
            if embedded.len() != inputs.len() {
                return Err(DocError::Generation(format!(
                    "embedding returned {} vectors for {} texts",
                    embedded.len(),
                    inputs.len()
                )));
            }
            vectors.extend(embedded);
        }

        let dims = embedder.dims().unwrap_or(vectors[0].len());
        if dims == 0 {
            return Err(DocError::Generation(
                "embedding returned zero-length vectors".to_string(),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(DocError::Generation(format!(
                "embedding dimension mismatch: expected {}, got {}",
                dims,
                bad.len()
            )));
        }

        info!(
            chunks = chunks.len(),
            dims,
            model = embedder.model_name(),
            "corpus index built"
        );
        Ok(Self {
            chunks,
            vectors,
            dims,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The `k` chunks most similar to `query_vec`, best first.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<ScoredChunk<'_>> {
        let mut scored: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .zip(self.vectors.iter())
            .map(|(chunk, vector)| ScoredChunk {
                chunk,
                score: cosine_similarity(query_vec, vector),
            })
            .collect();

        // Stable sort: ties keep insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    /// Embed a natural-language query and return the top `k` chunks.
    pub async fn query(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk<'_>>> {
        let query_vec = embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| DocError::generation("query embedding failed", e))?
            .into_iter()
            .next()
            .ok_or_else(|| DocError::Generation("empty embedding response".to_string()))?;

        if query_vec.len() != self.dims {
            return Err(DocError::Generation(format!(
                "query embedding has {} dimensions, index has {}",
                query_vec.len(),
                self.dims
            )));
        }
        Ok(self.search(&query_vec, k))
    }
}

pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result as AnyResult;
    use async_trait::async_trait;

    /// Embeds text as counts of a few marker words.
    struct KeywordEmbedder;

    const WORDS: [&str; 3] = ["alpha", "beta", "gamma"];

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }
        fn dims(&self) -> Option<usize> {
            Some(WORDS.len())
        }
        async fn embed(&self, texts: &[String]) -> AnyResult<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| WORDS.iter().map(|w| t.matches(w).count() as f32).collect())
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model_name(&self) -> &str {
            "failing"
        }
        fn dims(&self) -> Option<usize> {
            None
        }
        async fn embed(&self, _texts: &[String]) -> AnyResult<Vec<Vec<f32>>> {
            anyhow::bail!("connection refused")
        }
    }

    fn config() -> EmbeddingConfig {
        EmbeddingConfig {
            batch_size: 2,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn all_empty_texts_is_empty_corpus() {
        let err = CorpusIndex::build(&KeywordEmbedder, &config(), &["", "  \n", "\t"])
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::EmptyCorpus(_)));
    }

    #[tokio::test]
    async fn one_non_empty_text_builds() {
        let index = CorpusIndex::build(&KeywordEmbedder, &config(), &["", "alpha"])
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.dims(), 3);
    }

    #[tokio::test]
    async fn duplicate_contents_collapse() {
        let index = CorpusIndex::build(&KeywordEmbedder, &config(), &["alpha", "beta", "alpha"])
            .await
            .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.chunks()[0].hash, content_hash("alpha"));
    }

    #[tokio::test]
    async fn query_ranks_by_similarity() {
        let texts = ["gamma gamma", "alpha beta", "alpha alpha alpha", "beta"];
        let index = CorpusIndex::build(&KeywordEmbedder, &config(), &texts)
            .await
            .unwrap();
        let hits = index.query(&KeywordEmbedder, "alpha", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "alpha alpha alpha");
        assert_eq!(hits[1].chunk.text, "alpha beta");
    }

    #[tokio::test]
    async fn ties_keep_insertion_order_and_queries_are_repeatable() {
        let texts = ["beta one", "gamma", "beta two", "beta three"];
        let index = CorpusIndex::build(&KeywordEmbedder, &config(), &texts)
            .await
            .unwrap();
        let first: Vec<String> = index
            .query(&KeywordEmbedder, "beta", 3)
            .await
            .unwrap()
            .iter()
            .map(|h| h.chunk.text.clone())
            .collect();
        let second: Vec<String> = index
            .query(&KeywordEmbedder, "beta", 3)
            .await
            .unwrap()
            .iter()
            .map(|h| h.chunk.text.clone())
            .collect();
        assert_eq!(first, vec!["beta one", "beta two", "beta three"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn k_larger_than_corpus_returns_everything() {
        let index = CorpusIndex::build(&KeywordEmbedder, &config(), &["alpha", "beta"])
            .await
            .unwrap();
        assert_eq!(index.query(&KeywordEmbedder, "alpha", 8).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn embedder_failure_is_generation_error() {
        let err = CorpusIndex::build(&FailingEmbedder, &config(), &["alpha"])
            .await
            .unwrap_err();
        assert!(matches!(err, DocError::Generation(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
