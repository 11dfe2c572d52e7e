use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use passage_core::config::{expand_path, Config, Settings};
use passage_core::data_processor::DataProcessor;
use passage_core::traits::Embedder;
use passage_embed::get_default_embedder;
use passage_hybrid::{HybridRetriever, Ingestor};
use passage_rerank::get_default_reranker;
use passage_text::LexicalIndex;
use passage_vector::{LanceVectorStore, VectorRetriever};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: passage-cli <ingest [DIR] [--limit N] | query \"<question>\" [K] | reindex>";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{}", USAGE); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn build_retriever(settings: &Settings) -> anyhow::Result<(Arc<HybridRetriever>, Arc<LanceVectorStore>)> {
    let embedding_dir = settings.models.embedding_dir.as_deref().map(expand_path);
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(embedding_dir.as_deref())?);
    let lancedb_dir = expand_path(&settings.data.lancedb_dir);
    std::fs::create_dir_all(&lancedb_dir)?;
    let store = Arc::new(LanceVectorStore::open(&lancedb_dir.to_string_lossy(), &settings.data.table, embedder.dim())?);
    info!(uri = %lancedb_dir.display(), table = %settings.data.table, "vector store opened");
    let reranker = get_default_reranker(settings.models.reranker_dir.as_deref().map(expand_path));
    let retriever = HybridRetriever::open(
        settings.retrieval.clone(),
        VectorRetriever::new(store.clone(), embedder),
        Arc::new(LexicalIndex::new()?),
        Arc::new(reranker),
    )?;
    Ok((Arc::new(retriever), store))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let (cmd, args) = parse_args();

    match cmd.as_str() {
        "ingest" => {
            let mut data_dir = None; let mut limit = None;
            let mut i = 0;
            while i < args.len() {
                match args[i].as_str() {
                    "--limit" => {
                        match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                            Some(n) => { limit = Some(n); i += 1; }
                            None => { eprintln!("Error: --limit requires a number"); std::process::exit(1); }
                        }
                    }
                    a if !a.starts_with('-') => data_dir = Some(PathBuf::from(a)),
                    _ => {}
                }
                i += 1;
            }
            let data_dir = data_dir.unwrap_or_else(|| expand_path(&settings.data.raw_dir));
            println!("Ingesting from {}", data_dir.display());
            let processor = DataProcessor::with_settings(&settings.chunking);
            let chunks = match limit {
                Some(n) => processor.process_directory_limited(&data_dir, n)?,
                None => processor.process_directory(&data_dir)?,
            };
            let (retriever, store) = build_retriever(&settings)?;
            let ids = Ingestor::new(retriever.clone()).with_progress(true).ingest_chunks(&chunks)?;
            println!("Ingested {} chunks ({} passages stored)", ids.len(), store.count()?);
        }
        "query" => {
            let Some(question) = args.first() else { eprintln!("{}", USAGE); std::process::exit(1) };
            let top_k = match args.get(1) {
                Some(v) => Some(v.parse::<usize>().map_err(|_| anyhow::anyhow!("K must be a positive integer, got '{}'", v))?),
                None => None,
            };
            let (retriever, _) = build_retriever(&settings)?;
            let results = retriever.retrieve(question, top_k)?;
            if results.is_empty() { println!("No passages found."); }
            for (rank, (doc, meta)) in results.documents.iter().zip(&results.metadatas).enumerate() {
                let source = meta.get("source").and_then(|v| v.as_str()).unwrap_or("-");
                println!("[{}] {}\n{}\n", rank + 1, source, doc);
            }
        }
        "reindex" => {
            let (retriever, store) = build_retriever(&settings)?;
            let count = retriever.rebuild_lexical_index()?;
            println!("Lexical index rebuilt over {} of {} stored passages", count, store.count()?);
        }
        _ => { eprintln!("Unknown command: {}\n{}", cmd, USAGE); std::process::exit(1); }
    }
    Ok(())
}
