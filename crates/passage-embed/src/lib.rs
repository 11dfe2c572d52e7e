//! passage-embed
//!
//! Embedding service implementations: a local BGE-M3 (XLM-RoBERTa) model run
//! with candle, and a deterministic hash-based fake for tests and development.
//! `APP_USE_FAKE_EMBEDDINGS=1` selects the fake.

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};
use twox_hash::XxHash64;

use passage_core::error::Error;
use passage_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

pub const EMBEDDING_DIM: usize = 1024;
const MAX_LEN: usize = 256;

pub struct EmbeddingModel { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device }

impl EmbeddingModel {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading BGE-M3 embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::unavailable("embedding model", format!("tokenizer {}: {}", tokenizer_path.display(), e)))?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let vb = VarBuilder::from_tensors(load_weights(model_dir, &device)?, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        info!("BGE-M3 model loaded");
        Ok(Self { model, tokenizer, device })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, MAX_LEN, &self.device)?;
        let token_type_ids = Tensor::zeros((1, MAX_LEN), DType::I64, &self.device)?;
        let hidden_states = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden_states, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        if emb.len() != EMBEDDING_DIM {
            return Err(anyhow!("expected {} dims, model produced {}", EMBEDDING_DIM, emb.len()));
        }
        if start.elapsed().as_millis() > 100 { debug!(ms = start.elapsed().as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

/// `model.safetensors` when present, otherwise the pickled `pytorch_model.bin`.
pub fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return Ok(candle_core::safetensors::load(&safetensors, device)?);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if !pickle.exists() {
        return Err(Error::unavailable("model weights", format!("no weights under {}", model_dir.display())).into());
    }
    candle_core::pickle::read_all(&pickle)?
        .into_iter()
        .map(|(name, tensor)| Ok::<_, anyhow::Error>((name, tensor.to_device(device)?)))
        .collect()
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { EMBEDDING_DIM }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

/// Hashes whitespace tokens into buckets. Same text, same vector; texts
/// sharing words land close together.
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder { pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } } }

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

impl FakeEmbedder {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// The fake when `APP_USE_FAKE_EMBEDDINGS` is set, otherwise BGE-M3 from
/// `model_dir` or the first conventional location that exists.
pub fn get_default_embedder(model_dir: Option<&Path>) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() { info!("using FakeEmbedder"); return Ok(Box::new(FakeEmbedder::new(EMBEDDING_DIM))); }
    let dir = resolve_model_dir(model_dir)?;
    Ok(Box::new(EmbeddingModel::load(&dir)?))
}

fn resolve_model_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit { if p.exists() { return Ok(p.to_path_buf()); } warn!(dir = %p.display(), "configured embedding model dir missing"); }
    for var in ["APP_MODEL_DIR", "MODEL_DIR"] {
        if let Ok(dir) = std::env::var(var) { let p = PathBuf::from(&dir); if p.exists() { info!(var, dir = %p.display(), "using model dir from env"); return Ok(p); } }
    }
    for candidate in ["../models/bge-m3", "models/bge-m3"] {
        let p = Path::new(candidate); if p.exists() { return Ok(p.to_path_buf()); }
    }
    Err(Error::unavailable("embedding model", "could not locate BGE-M3 model directory").into())
}
