use anyhow::{anyhow, Result};
use arrow_array::{Float32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;

use crate::writer::LanceDbIndexer;
use sbyec_core::traits::VectorIndexer;
use sbyec_core::types::{DocumentChunk, SearchHit, SourceKind};

impl LanceDbIndexer {
	async fn search_async(&self, q_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if !self.db.table_names().execute().await?.contains(&self.table_name) { return Ok(Vec::new()); }
		let table = self.db.open_table(&self.table_name).execute().await?;
		let mut stream = table.vector_search(q_vec.to_vec())?.distance_type(DistanceType::Cosine).limit(k).execute().await?;
		let mut hits = Vec::new();
		while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
			let ids = string_column(&batch, "id")?;
			let contents = string_column(&batch, "content")?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
			for i in 0..batch.num_rows() {
				// Cosine distance; 1 - d is the similarity.
				let score = distances.map_or(0.0, |d| 1.0 - d.value(i));
				hits.push(SearchHit { id: ids.value(i).to_string(), score, source: SourceKind::Vector, content: contents.value(i).to_string() });
			}
		}
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(k);
		Ok(hits)
	}
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| anyhow!("LanceDB result is missing string column '{}'", name))
}

impl VectorIndexer for LanceDbIndexer {
	fn index(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<()> {
		self.rt.block_on(self.index_async(chunks, embeddings))
	}

	fn search_vec(&self, q_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 { return Ok(Vec::new()); }
		self.rt.block_on(self.search_async(q_vec, k))
	}
}
