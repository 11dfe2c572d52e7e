//! passage-rerank
//!
//! Cross-encoder reranking. The model is loaded on first use, exactly once,
//! even when several threads ask for it at the same time. An empty candidate
//! list never triggers a load. `APP_USE_FAKE_RERANKER=1` swaps in a
//! token-overlap scorer.

use anyhow::Result;
use once_cell::sync::OnceCell;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

pub mod cross_encoder;

pub use cross_encoder::{CrossEncoderLoader, CrossEncoderModel};

/// Scores one (query, passage) pair. Higher is more relevant.
pub trait PairScorer: Send + Sync {
    fn score_pair(&self, query: &str, document: &str) -> Result<f32>;
}

/// Produces the scorer the first time a [`Reranker`] needs one.
pub trait ScorerLoader: Send + Sync {
    fn load(&self) -> Result<Box<dyn PairScorer>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RerankResult {
    /// Position of the passage in the input slice.
    pub index: usize,
    pub score: f32,
}

pub fn sigmoid(x: f32) -> f32 { 1.0 / (1.0 + (-x).exp()) }

pub struct Reranker {
    loader: Box<dyn ScorerLoader>,
    scorer: OnceCell<Box<dyn PairScorer>>,
}

impl Reranker {
    pub fn new(loader: impl ScorerLoader + 'static) -> Self {
        Self { loader: Box::new(loader), scorer: OnceCell::new() }
    }

    pub fn is_loaded(&self) -> bool { self.scorer.get().is_some() }

    fn scorer(&self) -> Result<&dyn PairScorer> {
        let scorer = self.scorer.get_or_try_init(|| {
            info!("loading reranker");
            self.loader.load()
        })?;
        Ok(scorer.as_ref())
    }

    /// Scores every passage against `query` and returns them best first.
    /// Ties keep input order. `top_k` of `None` keeps all.
    pub fn rank(&self, query: &str, documents: &[String], top_k: Option<usize>) -> Result<Vec<RerankResult>> {
        if documents.is_empty() { return Ok(Vec::new()); }
        let scorer = self.scorer()?;
        let mut results = documents
            .iter()
            .enumerate()
            .map(|(index, doc)| Ok::<_, anyhow::Error>(RerankResult { index, score: scorer.score_pair(query, doc)? }))
            .collect::<Result<Vec<_>>>()?;
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        if let Some(k) = top_k { results.truncate(k); }
        debug!(candidates = documents.len(), kept = results.len(), "reranked");
        Ok(results)
    }

    pub fn rerank(&self, query: &str, documents: &[String], top_k: Option<usize>) -> Result<Vec<(String, f32)>> {
        Ok(self
            .rank(query, documents, top_k)?
            .into_iter()
            .map(|r| (documents[r.index].clone(), r.score))
            .collect())
    }
}

/// Fraction of distinct query tokens that also occur in the passage.
pub struct OverlapScorer;

fn token_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(|t| t.to_lowercase()).collect()
}

impl PairScorer for OverlapScorer {
    fn score_pair(&self, query: &str, document: &str) -> Result<f32> {
        let q = token_set(query);
        if q.is_empty() { return Ok(0.0); }
        let d = token_set(document);
        Ok(q.intersection(&d).count() as f32 / q.len() as f32)
    }
}

pub struct OverlapLoader;

impl ScorerLoader for OverlapLoader {
    fn load(&self) -> Result<Box<dyn PairScorer>> { Ok(Box::new(OverlapScorer)) }
}

pub fn use_fake_reranker() -> bool {
    std::env::var("APP_USE_FAKE_RERANKER").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Nothing is loaded here; the cross-encoder is read on the first `rank`.
pub fn get_default_reranker(model_dir: Option<PathBuf>) -> Reranker {
    if use_fake_reranker() {
        info!("using OverlapScorer reranker");
        return Reranker::new(OverlapLoader);
    }
    Reranker::new(CrossEncoderLoader::new(model_dir))
}
