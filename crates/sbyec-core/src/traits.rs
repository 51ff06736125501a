use crate::types::{DocumentChunk, Passage, SearchHit};

pub trait Embedder: Send + Sync {
    /// Stable identifier recorded in the index manifest.
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

pub trait TextIndexer: Send + Sync {
    fn index(&self, chunks: &[DocumentChunk]) -> anyhow::Result<()>;
    fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

pub trait VectorIndexer: Send + Sync {
    fn index(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> anyhow::Result<()>;
    fn search_vec(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// Similarity search over passages, ranked descending.
///
/// Implementations are read-only after construction and shared between
/// concurrent callers.
pub trait ChunkStore: Send + Sync {
    fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<Passage>>;
}
