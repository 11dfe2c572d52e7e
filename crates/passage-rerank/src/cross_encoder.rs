//! BERT cross-encoder (`ms-marco-MiniLM-L-6-v2` layout) run with candle.
//!
//! Query and passage are encoded together as one `[CLS] q [SEP] d [SEP]`
//! sequence; the pooled `[CLS]` state goes through a single-logit classifier.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{info, warn};

use passage_core::error::Error;
use passage_embed::{load_weights, select_device};

use crate::{sigmoid, PairScorer, ScorerLoader};

pub const DEFAULT_MODEL: &str = "cross-encoder/ms-marco-MiniLM-L-6-v2";
const MAX_LEN: usize = 512;

pub struct CrossEncoderModel {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
}

impl CrossEncoderModel {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading cross-encoder");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        tokenizer
            .with_truncation(Some(TruncationParams { max_length: MAX_LEN, ..Default::default() }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(model_dir.join("config.json"))?)?;
        let vb = VarBuilder::from_tensors(load_weights(model_dir, &device)?, DType::F32, &device);
        let bert = BertModel::load(vb.clone(), &config)?;
        let pooler = candle_nn::linear(config.hidden_size, config.hidden_size, vb.pp("bert.pooler.dense"))?;
        let classifier = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;
        info!("cross-encoder loaded");
        Ok(Self { bert, pooler, classifier, tokenizer, device })
    }

    /// Relevance of `document` to `query` in `(0, 1)`.
    pub fn score(&self, query: &str, document: &str) -> Result<f32> {
        let enc = self.tokenizer.encode((query, document), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let input_ids = Tensor::new(enc.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = Tensor::new(enc.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(enc.get_attention_mask(), &self.device)?.unsqueeze(0)?;
        let hidden = self.bert.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logit = self
            .classifier
            .forward(&pooled)?
            .flatten_all()?
            .to_vec1::<f32>()?
            .first()
            .copied()
            .ok_or_else(|| anyhow!("classifier produced no logit"))?;
        Ok(sigmoid(logit))
    }
}

impl PairScorer for CrossEncoderModel {
    fn score_pair(&self, query: &str, document: &str) -> Result<f32> { self.score(query, document) }
}

/// Locates and loads the cross-encoder on first use.
pub struct CrossEncoderLoader { model_dir: Option<PathBuf> }

impl CrossEncoderLoader {
    pub fn new(model_dir: Option<PathBuf>) -> Self { Self { model_dir } }
}

impl ScorerLoader for CrossEncoderLoader {
    fn load(&self) -> Result<Box<dyn PairScorer>> {
        let dir = resolve_model_dir(self.model_dir.as_deref())?;
        let model = CrossEncoderModel::load(&dir).map_err(|e| Error::unavailable("reranker model", e))?;
        Ok(Box::new(model))
    }
}

fn resolve_model_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit { if p.exists() { return Ok(p.to_path_buf()); } warn!(dir = %p.display(), "configured reranker model dir missing"); }
    if let Ok(dir) = std::env::var("APP_RERANKER_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { return Ok(p); } }
    for candidate in ["../models/ms-marco-MiniLM-L-6-v2", "models/ms-marco-MiniLM-L-6-v2"] {
        let p = Path::new(candidate); if p.exists() { return Ok(p.to_path_buf()); }
    }
    Err(Error::unavailable("reranker model", format!("could not locate {} model directory", DEFAULT_MODEL)).into())
}
