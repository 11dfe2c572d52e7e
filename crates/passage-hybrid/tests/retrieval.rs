mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{counting_reranker, meta, retriever, settings, strings, ConstantEmbedder, ScriptedStore};
use passage_core::traits::PassageRetriever;
use passage_core::types::{Meta, Retrieved};

fn six_hits() -> ScriptedStore {
    ScriptedStore::new(&[("d0", 0.0), ("d1", 0.1), ("d2", 0.2), ("d3", 0.3), ("d4", 0.4), ("d5", 0.5)], &[])
}

fn keyword_store() -> ScriptedStore {
    ScriptedStore::new(&[("alpha doc", 0.1), ("beta doc", 0.2)], &["alpha doc", "beta doc", "gamma keyword"])
}

#[test]
fn vector_only_without_rerank_returns_top_k_in_similarity_order() {
    let store = Arc::new(six_hits());
    let (reranker, loads) = counting_reranker();
    let r = retriever(settings(false, false), store.clone(), Arc::new(ConstantEmbedder), reranker);

    let out = r.retrieve("anything", Some(3)).unwrap();
    assert_eq!(out.documents, strings(&["d0", "d1", "d2"]));
    assert_eq!(out.metadatas, vec![meta("d0"), meta("d1"), meta("d2")]);
    assert_eq!(*store.requested_k.lock().unwrap(), vec![3]);
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[test]
fn default_top_k_applies_when_none_given() {
    let (reranker, _) = counting_reranker();
    let r = retriever(settings(false, false), Arc::new(six_hits()), Arc::new(ConstantEmbedder), reranker);
    assert_eq!(r.retrieve("anything", None).unwrap().len(), 4);
}

#[test]
fn empty_corpus_yields_empty_result_in_every_configuration() {
    for (hybrid, rerank) in [(true, true), (true, false), (false, true), (false, false)] {
        let (reranker, loads) = counting_reranker();
        let r = retriever(settings(hybrid, rerank), Arc::new(ScriptedStore::empty()), Arc::new(ConstantEmbedder), reranker);
        assert_eq!(r.rebuild_lexical_index().unwrap(), 0);
        assert_eq!(r.retrieve("where is everything", Some(5)).unwrap(), Retrieved::default());
        assert_eq!(loads.load(Ordering::SeqCst), 0, "reranker must not load for an empty pool");
    }
}

#[test]
fn hybrid_blends_lexical_only_hits_into_the_pool() {
    let store = Arc::new(keyword_store());
    let (reranker, _) = counting_reranker();
    let r = retriever(settings(true, false), store.clone(), Arc::new(ConstantEmbedder), reranker);
    assert_eq!(r.lexical_index().doc_count(), 3);

    let out = r.retrieve("keyword", Some(3)).unwrap();
    // alpha: 1.0 * 0.7, gamma: 1.0 * 0.3, beta: 0.0
    assert_eq!(out.documents, strings(&["alpha doc", "gamma keyword", "beta doc"]));
    assert_eq!(out.metadatas, vec![meta("alpha doc"), Meta::new(), meta("beta doc")]);
    assert_eq!(*store.requested_k.lock().unwrap(), vec![9]);
}

#[test]
fn hybrid_rerank_reorders_with_metadata_aligned() {
    let (reranker, loads) = counting_reranker();
    let r = retriever(settings(true, true), Arc::new(keyword_store()), Arc::new(ConstantEmbedder), reranker);

    let out = r.retrieve("keyword", Some(2)).unwrap();
    assert_eq!(out.documents, strings(&["gamma keyword", "alpha doc"]));
    assert_eq!(out.metadatas, vec![Meta::new(), meta("alpha doc")]);

    r.retrieve("keyword", Some(2)).unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn vector_only_rerank_reorders_k_candidates() {
    let store = Arc::new(ScriptedStore::new(&[("a b", 0.1), ("keyword c", 0.3), ("d", 0.5)], &[]));
    let (reranker, _) = counting_reranker();
    let r = retriever(settings(false, true), store.clone(), Arc::new(ConstantEmbedder), reranker);

    let out = r.retrieve("keyword", Some(2)).unwrap();
    assert_eq!(out.documents, strings(&["keyword c", "a b"]));
    assert_eq!(out.metadatas, vec![meta("keyword c"), meta("a b")]);
    assert_eq!(*store.requested_k.lock().unwrap(), vec![2]);
}

#[test]
fn first_hybrid_query_sees_lexical_only_hits() {
    let store = Arc::new(keyword_store());
    let (reranker, _) = counting_reranker();
    let r = retriever(settings(true, false), store.clone(), Arc::new(ConstantEmbedder), reranker);

    let out = r.retrieve("keyword", Some(3)).unwrap();
    assert!(out.documents.contains(&"gamma keyword".to_string()));
    r.retrieve("alpha", Some(3)).unwrap();
    assert_eq!(store.dumps.load(Ordering::SeqCst), 1, "corpus is dumped once, at open");
}

#[test]
fn vector_only_open_skips_the_corpus_dump() {
    let store = Arc::new(keyword_store());
    let (reranker, _) = counting_reranker();
    let r = retriever(settings(false, true), store.clone(), Arc::new(ConstantEmbedder), reranker);
    r.retrieve("keyword", Some(2)).unwrap();
    assert_eq!(store.dumps.load(Ordering::SeqCst), 0);
    assert!(r.lexical_index().is_empty());
}

#[test]
fn usable_through_the_retriever_trait() {
    let (reranker, _) = counting_reranker();
    let r = retriever(settings(false, false), Arc::new(six_hits()), Arc::new(ConstantEmbedder), reranker);
    let dyn_retriever: &dyn PassageRetriever = &r;
    assert_eq!(dyn_retriever.retrieve("q", Some(1)).unwrap().documents, strings(&["d0"]));
}
