use anyhow::{anyhow, Result};
use std::sync::Arc;

use passage_core::traits::{Embedder, VectorStore};
use passage_core::types::{Candidate, Meta, VectorMatches};

/// Cosine distance in `[0, 2]` to similarity (`1.0` = identical).
pub fn distance_to_similarity(distance: f32) -> f32 { 1.0 - distance }

/// Stateless call-through to the vector store: embeds the query, fetches the
/// nearest passages and converts distances to similarities.
#[derive(Clone)]
pub struct VectorRetriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self { Self { store, embedder } }

    pub fn store(&self) -> &Arc<dyn VectorStore> { &self.store }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    /// Raw store answer: documents, metadatas and cosine distances, best first.
    pub fn query_similar(&self, query: &str, top_k: usize) -> Result<VectorMatches> {
        if top_k == 0 { return Ok(VectorMatches::default()); }
        let embedding = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
        self.store.query(&embedding, top_k)
    }

    /// Same as [`query_similar`](Self::query_similar) with scores as similarities.
    pub fn similar(&self, query: &str, top_k: usize) -> Result<Vec<Candidate>> {
        let VectorMatches { documents, metadatas, distances } = self.query_similar(query, top_k)?;
        let mut metadatas = metadatas.into_iter();
        Ok(documents
            .into_iter()
            .zip(distances)
            .map(|(content, distance)| Candidate::from_vector(content, metadatas.next().unwrap_or_else(Meta::new), distance_to_similarity(distance)))
            .collect())
    }
}
