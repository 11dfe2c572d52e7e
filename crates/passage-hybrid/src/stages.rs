//! Retrieval configuration resolved once into an ordered list of stages.

use passage_core::config::RetrievalSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    /// Nearest neighbours from the vector store, scored as similarities.
    Vector,
    /// BM25 candidates from the lexical index.
    Lexical,
    /// Normalize both sides and blend them.
    Fuse { lexical_weight: f32 },
    /// Cross-encoder reorder down to `k`.
    Rerank,
    Truncate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalPlan {
    stages: Vec<Stage>,
    candidate_multiplier: usize,
}

impl RetrievalPlan {
    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        let mut stages = vec![Stage::Vector];
        if settings.hybrid_search_enabled {
            stages.push(Stage::Lexical);
            stages.push(Stage::Fuse { lexical_weight: settings.lexical_weight });
        }
        stages.push(if settings.reranker_enabled { Stage::Rerank } else { Stage::Truncate });
        Self { stages, candidate_multiplier: settings.candidate_multiplier }
    }

    pub fn stages(&self) -> &[Stage] { &self.stages }

    pub fn is_hybrid(&self) -> bool { self.stages.contains(&Stage::Lexical) }

    /// Size of the pool gathered from each side before the final cut.
    pub fn candidate_k(&self, k: usize) -> usize {
        if self.is_hybrid() { k.saturating_mul(self.candidate_multiplier) } else { k }
    }
}
