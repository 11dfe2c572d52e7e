use anyhow::{anyhow, Result};
use arrow_array::{Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType};
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use passage_core::error::Error;
use passage_core::traits::VectorStore;
use passage_core::types::{CorpusDump, Meta, VectorMatches};

use crate::schema::{build_passage_schema, CONTENT_COLUMN, DISTANCE_COLUMN, ID_COLUMN, METADATA_COLUMN};
use crate::table::{open_db, table_exists};

/// LanceDB table of passages searched by cosine distance.
///
/// The trait surface is blocking; calls are driven on a runtime owned by the
/// store, so it must not be used from inside another tokio runtime.
pub struct LanceVectorStore {
	runtime: Runtime,
	db: Connection,
	table_name: String,
	dim: usize,
}

impl LanceVectorStore {
	pub fn open(uri: &str, table_name: &str, dim: usize) -> Result<Self> {
		let runtime = Runtime::new()?;
		let db = runtime.block_on(open_db(uri)).map_err(|e| Error::unavailable("vector store", e))?;
		info!(uri, table = table_name, dim, "opened LanceDB vector store");
		Ok(Self { runtime, db, table_name: table_name.to_string(), dim })
	}

	pub fn count(&self) -> Result<usize> {
		self.runtime.block_on(async {
			if !table_exists(&self.db, &self.table_name).await? { return Ok(0); }
			let table = self.db.open_table(&self.table_name).execute().await?;
			Ok(table.count_rows(None).await?)
		})
	}

	fn to_record_batch(&self, ids: &[String], documents: &[String], metadatas: &[Meta], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
		let metadata_json = metadatas.iter().map(serde_json::to_string).collect::<Result<Vec<_>, _>>()?;
		let vectors: Vec<Option<Vec<Option<f32>>>> = embeddings.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect())).collect();
		Ok(RecordBatch::try_new(build_passage_schema(self.dim as i32), vec![
			Arc::new(StringArray::from(ids.to_vec())),
			Arc::new(StringArray::from(documents.to_vec())),
			Arc::new(StringArray::from(metadata_json)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), self.dim as i32)),
		])?)
	}
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow!("{} column missing", name))
}

fn decode_metadata(raw: &str) -> Meta {
	serde_json::from_str(raw).unwrap_or_else(|e| {
		warn!(error = %e, "undecodable metadata, using empty map");
		Meta::new()
	})
}

impl VectorStore for LanceVectorStore {
	fn upsert(&self, ids: &[String], documents: &[String], metadatas: &[Meta], embeddings: &[Vec<f32>]) -> Result<()> {
		if ids.len() != documents.len() || ids.len() != metadatas.len() || ids.len() != embeddings.len() {
			return Err(Error::Mismatch(format!(
				"upsert got {} ids, {} documents, {} metadatas, {} embeddings",
				ids.len(), documents.len(), metadatas.len(), embeddings.len()
			)).into());
		}
		if ids.is_empty() { return Ok(()); }
		if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dim) {
			return Err(Error::Mismatch(format!("embedding has {} dims, table expects {}", bad.len(), self.dim)).into());
		}
		let batch = self.to_record_batch(ids, documents, metadatas, embeddings)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		self.runtime.block_on(async {
			if table_exists(&self.db, &self.table_name).await? {
				let table = self.db.open_table(&self.table_name).execute().await?;
				// id is the merge key
				let mut mi = table.merge_insert(&[ID_COLUMN]);
				mi.when_matched_update_all(None).when_not_matched_insert_all();
				let _ = mi.execute(reader).await?;
			} else {
				self.db.create_table(&self.table_name, reader).execute().await?;
			}
			debug!(rows = ids.len(), table = %self.table_name, "upserted passages");
			Ok(())
		})
	}

	fn query(&self, embedding: &[f32], top_k: usize) -> Result<VectorMatches> {
		if top_k == 0 { return Ok(VectorMatches::default()); }
		let mut rows: Vec<(String, Meta, f32)> = self.runtime.block_on(async {
			let mut rows = Vec::new();
			if !table_exists(&self.db, &self.table_name).await? { return Ok::<_, anyhow::Error>(rows); }
			let table = self.db.open_table(&self.table_name).execute().await?;
			if table.count_rows(None).await? == 0 { return Ok(rows); }
			let mut stream = table
				.vector_search(embedding.to_vec())?
				.distance_type(DistanceType::Cosine)
				.limit(top_k)
				.execute()
				.await?;
			while let Some(batch) = stream.try_next().await? {
				let contents = string_column(&batch, CONTENT_COLUMN)?;
				let metas = string_column(&batch, METADATA_COLUMN)?;
				let distances = batch
					.column_by_name(DISTANCE_COLUMN)
					.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
					.ok_or_else(|| anyhow!("{} column missing", DISTANCE_COLUMN))?;
				for i in 0..batch.num_rows() {
					rows.push((contents.value(i).to_string(), decode_metadata(metas.value(i)), distances.value(i)));
				}
			}
			Ok(rows)
		})?;
		rows.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));
		rows.truncate(top_k);
		let mut matches = VectorMatches::default();
		for (content, meta, distance) in rows {
			matches.documents.push(content);
			matches.metadatas.push(meta);
			matches.distances.push(distance);
		}
		Ok(matches)
	}

	fn get_all_documents(&self) -> Result<CorpusDump> {
		self.runtime.block_on(async {
			let mut dump = CorpusDump::default();
			if !table_exists(&self.db, &self.table_name).await? { return Ok(dump); }
			let table = self.db.open_table(&self.table_name).execute().await?;
			let mut stream = table.query().select(Select::columns(&[CONTENT_COLUMN, METADATA_COLUMN])).execute().await?;
			while let Some(batch) = stream.try_next().await? {
				let contents = string_column(&batch, CONTENT_COLUMN)?;
				let metas = string_column(&batch, METADATA_COLUMN)?;
				for i in 0..batch.num_rows() {
					if contents.is_null(i) { continue; }
					dump.documents.push(contents.value(i).to_string());
					dump.metadatas.push(decode_metadata(metas.value(i)));
				}
			}
			Ok(dump)
		})
	}
}
