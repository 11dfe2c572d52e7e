use crate::types::{CorpusDump, Meta, Retrieved, VectorMatches};

/// Turns texts into dense vectors. Output order matches input order and an
/// empty input yields an empty output.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// External nearest-neighbour store holding passages, their metadata and
/// embeddings.
pub trait VectorStore: Send + Sync {
    /// Insert or replace entries keyed by `ids`. All slices are parallel.
    fn upsert(&self, ids: &[String], documents: &[String], metadatas: &[Meta], embeddings: &[Vec<f32>]) -> anyhow::Result<()>;

    /// Best-first by ascending cosine distance (range `[0, 2]`).
    fn query(&self, embedding: &[f32], top_k: usize) -> anyhow::Result<VectorMatches>;

    /// Every stored entry. Order is stable between calls but otherwise
    /// unspecified.
    fn get_all_documents(&self) -> anyhow::Result<CorpusDump>;
}

/// The surface handed to answer generation: passages best-first with
/// positionally aligned metadata.
pub trait PassageRetriever: Send + Sync {
    fn retrieve(&self, query: &str, top_k: Option<usize>) -> anyhow::Result<Retrieved>;
}
