use anyhow::Result;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value};
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{doc, Index, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};
use tracing::{debug, info};

use crate::tantivy_utils::{analyze, build_analyzer, build_schema, register_analyzer, POSITION_FIELD, TEXT_FIELD};

const WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// The document list and the tantivy index built from it. Always replaced
/// together, never patched.
struct Snapshot {
	documents: Vec<String>,
	searcher: Option<Searcher>,
}

impl Snapshot {
	fn empty() -> Self { Self { documents: Vec::new(), searcher: None } }
}

/// BM25 keyword index over an ordered corpus snapshot.
///
/// `build` assembles a complete new snapshot off to the side and then swaps a
/// single `Arc`, so concurrent searches see either the old or the new corpus
/// and never a mix of the two.
pub struct LexicalIndex {
	analyzer: TextAnalyzer,
	schema: Schema,
	position_field: Field,
	text_field: Field,
	current: RwLock<Arc<Snapshot>>,
}

impl LexicalIndex {
	pub fn new() -> Result<Self> {
		let schema = build_schema();
		let position_field = schema.get_field(POSITION_FIELD)?;
		let text_field = schema.get_field(TEXT_FIELD)?;
		Ok(Self {
			analyzer: build_analyzer()?,
			schema,
			position_field,
			text_field,
			current: RwLock::new(Arc::new(Snapshot::empty())),
		})
	}

	/// Replace all prior state with an index over `documents`. Positions in
	/// search results refer to this order.
	pub fn build(&self, documents: Vec<String>) -> Result<()> {
		let snapshot = self.build_snapshot(documents)?;
		let count = snapshot.documents.len();
		*self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
		info!(documents = count, "lexical index rebuilt");
		Ok(())
	}

	fn build_snapshot(&self, documents: Vec<String>) -> Result<Snapshot> {
		if documents.is_empty() { return Ok(Snapshot::empty()); }
		let index = Index::create_in_ram(self.schema.clone());
		register_analyzer(&index, &self.analyzer);
		let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BUDGET)?;
		for (position, text) in documents.iter().enumerate() {
			writer.add_document(doc!(
				self.position_field => position as u64,
				self.text_field => text.to_lowercase(),
			))?;
		}
		writer.commit()?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Snapshot { documents, searcher: Some(reader.searcher()) })
	}

	fn snapshot(&self) -> Arc<Snapshot> {
		Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
	}

	/// Up to `top_k` `(position, score)` pairs, best first. Documents sharing
	/// no term with the query score `0.0` and fill the tail in corpus order.
	/// Empty when the index is unbuilt, the corpus is empty or the query has
	/// no terms.
	pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<(usize, f32)>> {
		self.search_snapshot(&self.snapshot(), query, top_k)
	}

	/// Like [`search`](Self::search) but resolves positions to text against the
	/// same snapshot, so a concurrent `build` cannot mismatch them.
	pub fn search_documents(&self, query: &str, top_k: usize) -> Result<Vec<(String, f32)>> {
		let snapshot = self.snapshot();
		let hits = self.search_snapshot(&snapshot, query, top_k)?;
		Ok(hits.into_iter().filter_map(|(p, score)| snapshot.documents.get(p).map(|d| (d.clone(), score))).collect())
	}

	fn search_snapshot(&self, snapshot: &Snapshot, query: &str, top_k: usize) -> Result<Vec<(usize, f32)>> {
		let Some(searcher) = snapshot.searcher.as_ref() else { return Ok(Vec::new()) };
		let terms = analyze(&self.analyzer, query);
		if terms.is_empty() || top_k == 0 { return Ok(Vec::new()); }

		let clauses: Vec<(Occur, Box<dyn Query>)> = terms
			.iter()
			.map(|t| {
				let term = Term::from_field_text(self.text_field, t);
				(Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
			})
			.collect();
		let bm25 = BooleanQuery::new(clauses);

		let limit = top_k.min(snapshot.documents.len());
		let top_docs = searcher.search(&bm25, &TopDocs::with_limit(limit))?;
		let mut hits = Vec::with_capacity(limit);
		let mut matched = HashSet::new();
		for (score, address) in top_docs {
			let doc: TantivyDocument = searcher.doc(address)?;
			let Some(position) = doc.get_first(self.position_field).and_then(|v| v.as_u64()) else { continue };
			let position = position as usize;
			matched.insert(position);
			hits.push((position, score));
		}
		hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
		debug!(terms = terms.len(), matched = hits.len(), "bm25 search");

		let missing = limit - hits.len();
		hits.extend((0..snapshot.documents.len()).filter(|p| !matched.contains(p)).take(missing).map(|p| (p, 0.0)));
		Ok(hits)
	}

	/// Document at `position`, or an empty string when out of range.
	pub fn get_document(&self, position: usize) -> String {
		self.snapshot().documents.get(position).cloned().unwrap_or_default()
	}

	pub fn doc_count(&self) -> usize { self.snapshot().documents.len() }

	pub fn is_empty(&self) -> bool { self.doc_count() == 0 }
}
