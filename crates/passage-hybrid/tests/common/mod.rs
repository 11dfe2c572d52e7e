#![allow(dead_code)]

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use passage_core::config::RetrievalSettings;
use passage_core::traits::{Embedder, VectorStore};
use passage_core::types::{CorpusDump, Meta, VectorMatches};
use passage_hybrid::HybridRetriever;
use passage_rerank::{OverlapScorer, PairScorer, Reranker, ScorerLoader};
use passage_text::LexicalIndex;
use passage_vector::VectorRetriever;

pub fn meta(source: &str) -> Meta {
    let mut m = Meta::new();
    m.insert("source".into(), source.into());
    m
}

pub fn strings(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

/// Returns a fixed best-first answer for every query, cut to `top_k`.
pub struct ScriptedStore {
    pub documents: Vec<String>,
    pub metadatas: Vec<Meta>,
    pub distances: Vec<f32>,
    pub corpus: Vec<String>,
    pub requested_k: Mutex<Vec<usize>>,
    pub dumps: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(hits: &[(&str, f32)], corpus: &[&str]) -> Self {
        Self {
            documents: hits.iter().map(|(d, _)| d.to_string()).collect(),
            metadatas: hits.iter().map(|(d, _)| meta(d)).collect(),
            distances: hits.iter().map(|(_, dist)| *dist).collect(),
            corpus: strings(corpus),
            requested_k: Mutex::new(Vec::new()),
            dumps: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self { Self::new(&[], &[]) }
}

impl VectorStore for ScriptedStore {
    fn upsert(&self, _: &[String], _: &[String], _: &[Meta], _: &[Vec<f32>]) -> Result<()> { Err(anyhow!("read-only store")) }

    fn query(&self, _embedding: &[f32], top_k: usize) -> Result<VectorMatches> {
        self.requested_k.lock().unwrap().push(top_k);
        let n = top_k.min(self.documents.len());
        Ok(VectorMatches {
            documents: self.documents[..n].to_vec(),
            metadatas: self.metadatas[..n].to_vec(),
            distances: self.distances[..n].to_vec(),
        })
    }

    fn get_all_documents(&self) -> Result<CorpusDump> {
        self.dumps.fetch_add(1, Ordering::SeqCst);
        Ok(CorpusDump { documents: self.corpus.clone(), metadatas: self.corpus.iter().map(|_| Meta::new()).collect() })
    }
}

/// In-memory cosine store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<(String, String, Meta, Vec<f32>)>>,
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { return 1.0; }
    1.0 - dot / (na * nb)
}

impl VectorStore for MemoryStore {
    fn upsert(&self, ids: &[String], documents: &[String], metadatas: &[Meta], embeddings: &[Vec<f32>]) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        for (((id, doc), m), e) in ids.iter().zip(documents).zip(metadatas).zip(embeddings) {
            let entry = (id.clone(), doc.clone(), m.clone(), e.clone());
            match entries.iter_mut().find(|x| &x.0 == id) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        Ok(())
    }

    fn query(&self, embedding: &[f32], top_k: usize) -> Result<VectorMatches> {
        let entries = self.entries.lock().unwrap();
        let mut scored: Vec<(f32, &String, &Meta)> = entries.iter().map(|(_, d, m, e)| (cosine_distance(embedding, e), d, m)).collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        scored.truncate(top_k);
        Ok(VectorMatches {
            documents: scored.iter().map(|s| s.1.clone()).collect(),
            metadatas: scored.iter().map(|s| s.2.clone()).collect(),
            distances: scored.iter().map(|s| s.0).collect(),
        })
    }

    fn get_all_documents(&self) -> Result<CorpusDump> {
        let entries = self.entries.lock().unwrap();
        Ok(CorpusDump {
            documents: entries.iter().map(|e| e.1.clone()).collect(),
            metadatas: entries.iter().map(|e| e.2.clone()).collect(),
        })
    }
}

/// Every text maps to the same unit vector.
pub struct ConstantEmbedder;

impl Embedder for ConstantEmbedder {
    fn dim(&self) -> usize { 2 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect()) }
}

pub struct CountingLoader { pub loads: Arc<AtomicUsize> }

impl ScorerLoader for CountingLoader {
    fn load(&self) -> Result<Box<dyn PairScorer>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(OverlapScorer))
    }
}

pub fn counting_reranker() -> (Arc<Reranker>, Arc<AtomicUsize>) {
    let loads = Arc::new(AtomicUsize::new(0));
    (Arc::new(Reranker::new(CountingLoader { loads: loads.clone() })), loads)
}

pub fn settings(hybrid: bool, rerank: bool) -> RetrievalSettings {
    RetrievalSettings { hybrid_search_enabled: hybrid, reranker_enabled: rerank, ..RetrievalSettings::default() }
}

pub fn retriever(
    settings: RetrievalSettings,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    reranker: Arc<Reranker>,
) -> HybridRetriever {
    let lexical = Arc::new(LexicalIndex::new().expect("lexical index"));
    HybridRetriever::open(settings, VectorRetriever::new(store, embedder), lexical, reranker).expect("open retriever")
}
