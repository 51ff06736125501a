//! The chunk store the answer router reads from: BM25 and dense retrieval
//! merged by passage id, plus the ingest pipeline that builds both indexes.
pub mod ingest;
pub mod status;
pub mod store;

pub use ingest::{ingest, ingest_with};
pub use status::IndexStatus;
pub use store::{open_store, open_store_with, open_text_index, DenseRetriever, HybridChunkStore};
