use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use passage_core::data_processor::DocumentChunk;
use passage_core::error::Error;
use passage_core::types::Meta;

use crate::HybridRetriever;

const EMBED_BATCH: usize = 64;

/// Writes passages into the vector store, then rebuilds the lexical index so
/// the next query sees them.
pub struct Ingestor {
    retriever: Arc<HybridRetriever>,
    batch_size: usize,
    show_progress: bool,
}

impl Ingestor {
    pub fn new(retriever: Arc<HybridRetriever>) -> Self {
        Self { retriever, batch_size: EMBED_BATCH, show_progress: false }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self { self.batch_size = batch_size.max(1); self }

    pub fn with_progress(mut self, show: bool) -> Self { self.show_progress = show; self }

    /// Store `texts` and return their ids. Missing ids are fresh UUIDv4s,
    /// missing metadata are empty maps.
    pub fn ingest(&self, texts: &[String], metadatas: Option<&[Meta]>, ids: Option<&[String]>) -> Result<Vec<String>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        if let Some(m) = metadatas {
            if m.len() != texts.len() {
                return Err(Error::Mismatch(format!("{} texts but {} metadatas", texts.len(), m.len())).into());
            }
        }
        if let Some(i) = ids {
            if i.len() != texts.len() {
                return Err(Error::Mismatch(format!("{} texts but {} ids", texts.len(), i.len())).into());
            }
        }
        let ids: Vec<String> = match ids {
            Some(ids) => ids.to_vec(),
            None => texts.iter().map(|_| Uuid::new_v4().to_string()).collect(),
        };
        let metadatas: Vec<Meta> = match metadatas {
            Some(m) => m.to_vec(),
            None => vec![Meta::new(); texts.len()],
        };

        let embeddings = self.embed_all(texts)?;
        self.retriever.vector_retriever().store().upsert(&ids, texts, &metadatas, &embeddings)?;
        info!(passages = ids.len(), "passages upserted");
        self.retriever.rebuild_lexical_index()?;
        Ok(ids)
    }

    /// Ingest chunks produced by the data processor, keeping their stable ids
    /// and `source`/`chunk` metadata.
    pub fn ingest_chunks(&self, chunks: &[DocumentChunk]) -> Result<Vec<String>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let metadatas: Vec<Meta> = chunks.iter().map(DocumentChunk::metadata).collect();
        let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
        self.ingest(&texts, Some(&metadatas), Some(&ids))
    }

    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embedder = self.retriever.vector_retriever().embedder();
        let pb = if self.show_progress { ProgressBar::new(texts.len() as u64) } else { ProgressBar::hidden() };
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} passages {msg}") {
            pb.set_style(style.progress_chars("#>-"));
        }
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(embedder.embed_batch(batch)?);
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("embedded");
        Ok(embeddings)
    }
}
