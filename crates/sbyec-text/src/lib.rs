//! sbyec-text
//!
//! Tantivy-based BM25 index over corpus passages. The index stores passage
//! content so search hits can be handed out as passages directly.
pub mod index;
pub mod search;
pub mod tantivy_utils;

pub use index::TantivyIndexer;
pub use search::SearchResult;
