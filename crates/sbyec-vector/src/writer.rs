use anyhow::{anyhow, ensure, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{connect, Connection};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::schema::build_arrow_schema;
use sbyec_core::types::DocumentChunk;

const INSERT_BATCH: usize = 1000;

/// One LanceDB table of passage embeddings.
///
/// LanceDB is async-only; the indexer owns a small multi-threaded runtime so
/// it can sit behind the blocking [`VectorIndexer`](sbyec_core::traits::VectorIndexer)
/// trait. Do not call it from inside another tokio runtime's async context.
pub struct LanceDbIndexer {
	pub(crate) rt: Runtime,
	pub(crate) db: Connection,
	pub(crate) table_name: String,
	pub(crate) dim: usize,
}

impl LanceDbIndexer {
	/// Start from an empty database directory; any previous table is removed.
	pub fn create(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		if db_path.exists() { std::fs::remove_dir_all(db_path)?; }
		std::fs::create_dir_all(db_path)?;
		Self::open(db_path, table_name, dim)
	}

	pub fn open(db_path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		let rt = tokio::runtime::Builder::new_multi_thread().worker_threads(2).enable_all().build()?;
		let uri = db_path.to_string_lossy().to_string();
		let db = rt.block_on(async { connect(&uri).execute().await })?;
		debug!("Connected to LanceDB at {}", uri);
		Ok(Self { rt, db, table_name: table_name.to_string(), dim })
	}

	pub fn table_exists(&self) -> Result<bool> {
		Ok(self.rt.block_on(async { self.db.table_names().execute().await })?.contains(&self.table_name))
	}

	pub(crate) async fn index_async(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<()> {
		if chunks.is_empty() { info!("No chunks to index"); return Ok(()); }
		ensure!(chunks.len() == embeddings.len(), "chunks ({}) and embeddings ({}) length must match", chunks.len(), embeddings.len());
		if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dim) {
			return Err(anyhow!("embedding has dimension {}, table expects {}", bad.len(), self.dim));
		}
		info!("Indexing {} chunks into LanceDB table {}", chunks.len(), self.table_name);
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} vectors {msg}")?.progress_chars("#>-"));
		for (batch_chunks, batch_vectors) in chunks.chunks(INSERT_BATCH).zip(embeddings.chunks(INSERT_BATCH)) {
			self.insert_batch(batch_chunks, batch_vectors).await?;
			pb.inc(batch_chunks.len() as u64);
		}
		pb.finish_with_message("done");
		info!("Indexed {} vectors", chunks.len());
		Ok(())
	}

	async fn insert_batch(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<()> {
		let record_batch = self.to_record_batch(chunks, vectors)?;
		let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if self.db.table_names().execute().await?.contains(&self.table_name) {
			self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
		} else {
			self.db.create_table(&self.table_name, reader).execute().await?;
		}
		Ok(())
	}

	fn to_record_batch(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
		let vectors = vectors.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));
		let record_batch = RecordBatch::try_new(build_arrow_schema(self.dim), vec![
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_path.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.content.as_str()))),
			Arc::new(Int32Array::from_iter_values(chunks.iter().map(|c| c.chunk_index as i32))),
			Arc::new(Int32Array::from_iter_values(chunks.iter().map(|c| c.total_chunks as i32))),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, self.dim as i32)),
		])?;
		Ok(record_batch)
	}
}
