use anyhow::Result;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{doc, Index, IndexReader, ReloadPolicy, TantivyDocument};
use tracing::{debug, info};

use sbyec_core::traits::TextIndexer;
use sbyec_core::types::{DocumentChunk, SearchHit, SourceKind};

use crate::tantivy_utils::{build_schema, register_tokenizer, PassageFields};

const WRITER_HEAP_BYTES: usize = 50_000_000;

pub struct TantivyIndexer {
	pub(crate) index: Index,
	pub(crate) reader: IndexReader,
	pub(crate) fields: PassageFields,
}

impl TantivyIndexer {
	/// Create a fresh on-disk index, wiping whatever was in `index_dir`.
	pub fn create(index_dir: &Path) -> Result<Self> {
		if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
		std::fs::create_dir_all(index_dir)?;
		let index = Index::create_in_dir(index_dir, build_schema())?;
		Self::from_index(index)
	}

	/// Open an index previously written by [`TantivyIndexer::create`].
	pub fn open(index_dir: &Path) -> Result<Self> {
		let index = Index::open_in_dir(index_dir)?;
		Self::from_index(index)
	}

	pub fn in_memory() -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()))
	}

	fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let fields = PassageFields::from_schema(&index.schema())?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Self { index, reader, fields })
	}

	pub fn num_docs(&self) -> u64 { self.reader.searcher().num_docs() }

	pub(crate) fn query_parser(&self) -> QueryParser {
		QueryParser::for_index(&self.index, vec![self.fields.text])
	}
}

impl TextIndexer for TantivyIndexer {
	fn index(&self, chunks: &[DocumentChunk]) -> Result<()> {
		let mut index_writer = self.index.writer(WRITER_HEAP_BYTES)?;
		for c in chunks {
			index_writer.add_document(doc!(
				self.fields.id => c.id.clone(),
				self.fields.doc_id => c.doc_id.clone(),
				self.fields.doc_path => c.doc_path.clone(),
				self.fields.text => c.content.clone(),
			))?;
		}
		index_writer.commit()?;
		self.reader.reload()?;
		info!("Tantivy: indexed {} passages", chunks.len());
		Ok(())
	}

	fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 { return Ok(Vec::new()); }
		let searcher = self.reader.searcher();
		// Questions carry punctuation the strict parser rejects.
		let (q, errors) = self.query_parser().parse_query_lenient(query);
		if !errors.is_empty() { debug!("Tantivy: lenient parse dropped {} fragment(s) of {:?}", errors.len(), query); }
		let top_docs = searcher.search(&q, &TopDocs::with_limit(k))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let id = doc.get_first(self.fields.id).and_then(|v| v.as_str()).unwrap_or("").to_string();
			let content = doc.get_first(self.fields.text).and_then(|v| v.as_str()).unwrap_or("").to_string();
			hits.push(SearchHit { id, score, source: SourceKind::Text, content });
		}
		Ok(hits)
	}
}
