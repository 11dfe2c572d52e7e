//! passage-hybrid
//!
//! Retrieval orchestration: vector candidates, BM25 candidates, score fusion
//! and cross-encoder reranking, run as a stage plan resolved once from the
//! retrieval settings. Also hosts the [`Ingestor`], which writes passages to
//! the vector store and refreshes the lexical index afterwards.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

use passage_core::config::RetrievalSettings;
use passage_core::traits::PassageRetriever;
use passage_core::types::{Candidate, Retrieved};
use passage_rerank::Reranker;
use passage_text::LexicalIndex;
use passage_vector::VectorRetriever;

pub mod fusion;
pub mod ingest;
pub mod normalize;
pub mod stages;

pub use fusion::{fuse, normalize_candidates};
pub use ingest::Ingestor;
pub use normalize::normalize;
pub use stages::{RetrievalPlan, Stage};

pub struct HybridRetriever {
    settings: RetrievalSettings,
    plan: RetrievalPlan,
    vector: VectorRetriever,
    lexical: Arc<LexicalIndex>,
    reranker: Arc<Reranker>,
}

impl HybridRetriever {
    /// Resolve the stage plan and, when it includes lexical search, load the
    /// lexical index from the store so the first query already sees it.
    pub fn open(settings: RetrievalSettings, vector: VectorRetriever, lexical: Arc<LexicalIndex>, reranker: Arc<Reranker>) -> Result<Self> {
        let plan = RetrievalPlan::from_settings(&settings);
        debug!(?plan, "retrieval plan resolved");
        let retriever = Self { settings, plan, vector, lexical, reranker };
        if retriever.plan.is_hybrid() { retriever.rebuild_lexical_index()?; }
        Ok(retriever)
    }

    pub fn vector_retriever(&self) -> &VectorRetriever { &self.vector }

    pub fn lexical_index(&self) -> &Arc<LexicalIndex> { &self.lexical }

    /// Reload the lexical index from a full corpus dump. Returns the number of
    /// indexed passages. Needed again only after the store changes.
    pub fn rebuild_lexical_index(&self) -> Result<usize> {
        let corpus = self.vector.store().get_all_documents()?;
        let count = corpus.documents.len();
        self.lexical.build(corpus.documents)?;
        info!(documents = count, "lexical index refreshed from vector store");
        Ok(count)
    }

    /// Best `top_k` passages for `query` (the configured default when `None`),
    /// metadata aligned by position.
    pub fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<Retrieved> {
        let k = top_k.unwrap_or(self.settings.default_top_k);
        let candidate_k = self.plan.candidate_k(k);
        let mut pool: Vec<Candidate> = Vec::new();
        let mut lexical: Vec<Candidate> = Vec::new();

        for stage in self.plan.stages() {
            match *stage {
                Stage::Vector => {
                    pool = self.vector.similar(query, candidate_k)?;
                    debug!(hits = pool.len(), candidate_k, "vector stage");
                }
                Stage::Lexical => {
                    lexical = self
                        .lexical
                        .search_documents(query, candidate_k)?
                        .into_iter()
                        .map(|(content, score)| Candidate::from_lexical(content, score))
                        .collect();
                    debug!(hits = lexical.len(), candidate_k, "lexical stage");
                }
                Stage::Fuse { lexical_weight } => {
                    let mut vector = std::mem::take(&mut pool);
                    normalize_candidates(&mut vector, &mut lexical);
                    pool = fuse(vector, std::mem::take(&mut lexical), lexical_weight, candidate_k);
                    debug!(pool = pool.len(), "fuse stage");
                }
                Stage::Rerank => {
                    if !pool.is_empty() { pool = self.rerank(query, pool, k)?; }
                }
                Stage::Truncate => pool.truncate(k),
            }
        }
        Ok(pool.into_iter().collect())
    }

    fn rerank(&self, query: &str, pool: Vec<Candidate>, k: usize) -> Result<Vec<Candidate>> {
        let texts: Vec<String> = pool.iter().map(|c| c.content.clone()).collect();
        let ranked = self.reranker.rank(query, &texts, Some(k))?;
        let mut slots: Vec<Option<Candidate>> = pool.into_iter().map(Some).collect();
        let reranked: Vec<Candidate> = ranked
            .into_iter()
            .filter_map(|r| {
                let mut c = slots.get_mut(r.index)?.take()?;
                c.rerank_score = Some(r.score);
                Some(c)
            })
            .collect();
        debug!(kept = reranked.len(), "rerank stage");
        Ok(reranked)
    }
}

impl PassageRetriever for HybridRetriever {
    fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<Retrieved> { HybridRetriever::retrieve(self, query, top_k) }
}
