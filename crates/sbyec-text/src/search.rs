//! Human-facing search output for the `search` command: hits with their
//! source path and a highlighted snippet.
use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::schema::Value;
use tantivy::snippet::SnippetGenerator;
use tantivy::TantivyDocument;

use crate::index::TantivyIndexer;

#[derive(Debug, Clone)]
pub struct SearchResult {
	pub score: f32,
	pub id: String,
	pub path: String,
	pub snippet: String,
}

impl TantivyIndexer {
	pub fn search_with_snippets(&self, query_text: &str, limit: usize) -> Result<Vec<SearchResult>> {
		if limit == 0 { return Ok(Vec::new()); }
		let searcher = self.reader.searcher();
		let (query, _) = self.query_parser().parse_query_lenient(query_text);
		let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;
		let snippet_generator = SnippetGenerator::create(&searcher, &*query, self.fields.text)?;
		let mut results = Vec::with_capacity(top_docs.len());
		for (score, doc_address) in top_docs {
			let doc: TantivyDocument = searcher.doc(doc_address)?;
			let id = doc.get_first(self.fields.id).and_then(|v| v.as_str()).unwrap_or("").to_string();
			let path = doc.get_first(self.fields.doc_path).and_then(|v| v.as_str()).unwrap_or("").to_string();
			let snippet = snippet_generator.snippet_from_doc(&doc).to_html();
			results.push(SearchResult { score, id, path, snippet });
		}
		Ok(results)
	}
}
