use passage_core::traits::{Embedder, VectorStore};
use passage_core::types::Meta;
use passage_embed::FakeEmbedder;
use passage_vector::LanceVectorStore;
use tempfile::TempDir;

const DIM: usize = 64;

fn meta(source: &str, chunk: usize) -> Meta {
    let mut m = Meta::new();
    m.insert("source".into(), source.into());
    m.insert("chunk".into(), chunk.into());
    m
}

fn seeded(tmp: &TempDir) -> (LanceVectorStore, FakeEmbedder) {
    let store = LanceVectorStore::open(&tmp.path().to_string_lossy(), "docs", DIM).expect("store");
    let embedder = FakeEmbedder::new(DIM);
    let docs: Vec<String> = ["how to start a fire with flint", "purifying water by boiling", "building a lean-to shelter"]
        .into_iter()
        .map(String::from)
        .collect();
    let ids: Vec<String> = (0..docs.len()).map(|i| format!("doc:{}", i)).collect();
    let metas: Vec<Meta> = (0..docs.len()).map(|i| meta("guide.md", i)).collect();
    let embs = embedder.embed_batch(&docs).expect("embed");
    store.upsert(&ids, &docs, &metas, &embs).expect("upsert");
    (store, embedder)
}

#[test]
fn lancedb_query_returns_nearest_first() {
    let tmp = TempDir::new().expect("tmp");
    let (store, embedder) = seeded(&tmp);
    let q = embedder.embed_batch(&["purifying water by boiling".to_string()]).expect("embed").remove(0);

    let matches = store.query(&q, 2).expect("query");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches.documents[0], "purifying water by boiling");
    assert!(matches.distances[0].abs() < 1e-4, "identical text has ~0 cosine distance");
    assert!(matches.distances[0] <= matches.distances[1]);
    assert_eq!(matches.metadatas[0]["chunk"], serde_json::json!(1));
}

#[test]
fn upsert_with_existing_id_replaces_the_row() {
    let tmp = TempDir::new().expect("tmp");
    let (store, embedder) = seeded(&tmp);
    let docs = vec!["boiling water for five minutes".to_string()];
    let embs = embedder.embed_batch(&docs).expect("embed");
    store.upsert(&["doc:1".to_string()], &docs, &[meta("guide.md", 1)], &embs).expect("upsert");

    assert_eq!(store.count().expect("count"), 3);
    let dump = store.get_all_documents().expect("dump");
    assert_eq!(dump.documents.len(), 3);
    assert_eq!(dump.metadatas.len(), 3);
    assert!(dump.documents.iter().any(|d| d == "boiling water for five minutes"));
    assert!(!dump.documents.iter().any(|d| d == "purifying water by boiling"));
}

#[test]
fn fresh_store_is_an_empty_corpus() {
    let tmp = TempDir::new().expect("tmp");
    let store = LanceVectorStore::open(&tmp.path().to_string_lossy(), "docs", DIM).expect("store");
    assert!(store.query(&vec![0.1; DIM], 5).expect("query").is_empty());
    assert!(store.get_all_documents().expect("dump").documents.is_empty());
    assert_eq!(store.count().expect("count"), 0);
}

#[test]
fn mismatched_upsert_is_rejected() {
    let tmp = TempDir::new().expect("tmp");
    let store = LanceVectorStore::open(&tmp.path().to_string_lossy(), "docs", DIM).expect("store");
    let err = store.upsert(&["a".to_string()], &[], &[], &[]).unwrap_err();
    assert!(err.to_string().contains("mismatch"), "{err}");
    let err = store.upsert(&["a".to_string()], &["x".to_string()], &[Meta::new()], &[vec![0.0; 3]]).unwrap_err();
    assert!(err.to_string().contains("dims"), "{err}");
}
