//! Domain types shared by the chunk store, the indexers and the answer router.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A chunk of a crawled page as produced by the corpus splitter.
///
/// - `id`: `<doc_id>:<chunk_index>`, unique across the corpus
/// - `doc_id`: file stem of the source `.txt` file
/// - `doc_path`: original path to the source file
/// - `content`: the text payload of the chunk
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub doc_path: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A retrieved passage handed to the extractor and the generative fallback.
///
/// Passages are read-only copies of what the chunk store holds; nothing
/// beyond the raw content is required downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: ChunkId,
    pub content: String,
}

impl Passage {
    pub fn new(id: impl Into<ChunkId>, content: impl Into<String>) -> Self {
        Self { id: id.into(), content: content.into() }
    }
}

/// Indicates which engine produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Text,
}

/// The surface returned by both engines.
///
/// `id` matches `DocumentChunk::id`. `score` is engine-specific but
/// higher is always better. `content` travels with the hit so the hybrid
/// store can hand out passages without a second lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
    pub source: SourceKind,
    pub content: String,
}

impl From<SearchHit> for Passage {
    fn from(hit: SearchHit) -> Self {
        Self { id: hit.id, content: hit.content }
    }
}
