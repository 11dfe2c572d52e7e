//! Domain types shared by the lexical, vector and reranking stages.

use serde::Serialize;
use std::collections::HashMap;

/// Arbitrary per-passage metadata (e.g. `{"source": "a.md", "chunk": 3}`).
pub type Meta = HashMap<String, serde_json::Value>;

/// A passage travelling through the pipeline together with the scores the
/// stages it went through assigned to it. Higher is always better.
///
/// - `vector_score`: cosine similarity, later min-max normalized
/// - `lexical_score`: BM25, later min-max normalized
/// - `fused_score`: weighted blend of the two normalized scores
/// - `rerank_score`: cross-encoder relevance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate {
    pub content: String,
    pub metadata: Meta,
    pub vector_score: Option<f32>,
    pub lexical_score: Option<f32>,
    pub fused_score: Option<f32>,
    pub rerank_score: Option<f32>,
}

impl Candidate {
    pub fn from_vector(content: String, metadata: Meta, similarity: f32) -> Self {
        Self { content, metadata, vector_score: Some(similarity), ..Self::default() }
    }

    /// Lexical hits carry no metadata.
    pub fn from_lexical(content: String, score: f32) -> Self {
        Self { content, lexical_score: Some(score), ..Self::default() }
    }
}

/// Raw nearest-neighbour answer from a vector store: parallel sequences
/// ordered by ascending distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorMatches {
    pub documents: Vec<String>,
    pub metadatas: Vec<Meta>,
    pub distances: Vec<f32>,
}

impl VectorMatches {
    pub fn len(&self) -> usize { self.documents.len() }
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }
}

/// Full corpus export used to rebuild the lexical index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusDump {
    pub documents: Vec<String>,
    pub metadatas: Vec<Meta>,
}

/// Final retrieval output: passages best-first, metadata positionally
/// aligned (an empty map where none is known).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retrieved {
    pub documents: Vec<String>,
    pub metadatas: Vec<Meta>,
}

impl Retrieved {
    pub fn len(&self) -> usize { self.documents.len() }
    pub fn is_empty(&self) -> bool { self.documents.is_empty() }
}

impl FromIterator<Candidate> for Retrieved {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        let (documents, metadatas) = iter.into_iter().map(|c| (c.content, c.metadata)).unzip();
        Self { documents, metadatas }
    }
}
