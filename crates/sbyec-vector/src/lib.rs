//! sbyec-vector
//!
//! LanceDB table of passage embeddings. Exposes a blocking
//! [`VectorIndexer`](sbyec_core::traits::VectorIndexer) over the async
//! LanceDB API by owning a small tokio runtime.
pub mod schema;
pub mod search;
pub mod writer;

pub use writer::LanceDbIndexer;
