use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, warn};

use sbyec_core::config::{RetrievalMode, Settings};
use sbyec_core::error::Error;
use sbyec_core::manifest::IndexManifest;
use sbyec_core::traits::{ChunkStore, Embedder, TextIndexer, VectorIndexer};
use sbyec_core::types::{Passage, SearchHit, SourceKind};
use sbyec_embed::get_default_embedder;
use sbyec_text::TantivyIndexer;
use sbyec_vector::LanceDbIndexer;

/// A vector index paired with the embedder that produced its vectors.
pub struct DenseRetriever {
    pub index: Box<dyn VectorIndexer>,
    pub embedder: Box<dyn Embedder>,
}

pub struct HybridChunkStore {
    text: Option<Box<dyn TextIndexer>>,
    dense: Option<DenseRetriever>,
}

impl HybridChunkStore {
    pub fn new(text: Option<Box<dyn TextIndexer>>, dense: Option<DenseRetriever>) -> Self { Self { text, dense } }

    pub fn text_only(text: impl TextIndexer + 'static) -> Self { Self::new(Some(Box::new(text)), None) }

    /// Ranked hits from every configured engine, merged by id.
    ///
    /// BM25 scores are divided by the best BM25 score so both sources land
    /// in roughly `[0, 1]`; on an id collision the higher score wins.
    pub fn query(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 { return Ok(Vec::new()); }
        let mut dense_hits = match &self.dense {
            Some(dense) => {
                let q_vec = dense.embedder.embed_batch(&[query.to_string()])?.into_iter().next().unwrap_or_default();
                dense.index.search_vec(&q_vec, k)?
            }
            None => Vec::new(),
        };
        for h in &mut dense_hits { h.source = SourceKind::Vector; }

        let mut text_hits = match &self.text {
            Some(text) => text.search(query, k)?,
            None => Vec::new(),
        };
        let best = text_hits.iter().map(|h| h.score).fold(0f32, f32::max);
        for h in &mut text_hits {
            h.source = SourceKind::Text;
            if best > 0.0 { h.score /= best; }
        }
        debug!("query {:?}: {} dense, {} text hits", query, dense_hits.len(), text_hits.len());

        let mut by_id: HashMap<String, SearchHit> = HashMap::new();
        for h in dense_hits.into_iter().chain(text_hits) {
            by_id.entry(h.id.clone()).and_modify(|old| if h.score > old.score { *old = h.clone(); }).or_insert(h);
        }
        let mut merged: Vec<SearchHit> = by_id.into_values().collect();
        merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.id.cmp(&b.id)));
        merged.truncate(k);
        Ok(merged)
    }
}

impl ChunkStore for HybridChunkStore {
    fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>> {
        Ok(self.query(query, k)?.into_iter().map(Passage::from).collect())
    }
}

/// Open the indexes written by [`crate::ingest`] for the configured mode.
pub fn open_store(settings: &Settings) -> Result<HybridChunkStore> {
    let embedder = match settings.retrieval.mode {
        RetrievalMode::Text => None,
        _ => Some(get_default_embedder()?),
    };
    open_store_with(settings, embedder)
}

/// The manifest of the live index generation.
fn live_manifest(settings: &Settings) -> Result<IndexManifest> {
    let manifest_path = settings.data.manifest_path();
    Ok(IndexManifest::load(&manifest_path)?
        .ok_or_else(|| Error::NotFound(format!("no index manifest at {}; run ingest first", manifest_path.display())))?)
}

/// The BM25 index of the live generation.
pub fn open_text_index(settings: &Settings) -> Result<TantivyIndexer> {
    let manifest = live_manifest(settings)?;
    TantivyIndexer::open(&settings.data.tantivy_generation_path(&manifest.generation))
}

pub fn open_store_with(settings: &Settings, embedder: Option<Box<dyn Embedder>>) -> Result<HybridChunkStore> {
    let manifest = live_manifest(settings)?;
    let mode = settings.retrieval.mode;
    debug!("Opening index generation {}", manifest.generation);

    let text: Option<Box<dyn TextIndexer>> = match mode {
        RetrievalMode::Vector => None,
        _ => Some(Box::new(TantivyIndexer::open(&settings.data.tantivy_generation_path(&manifest.generation))?)),
    };

    let dense = match (mode, embedder) {
        (RetrievalMode::Text, _) => None,
        (_, None) => return Err(Error::InvalidConfig(format!("retrieval mode {:?} needs an embedder", mode)).into()),
        (_, Some(embedder)) => {
            if manifest.embedder_id.as_deref() != Some(embedder.embedder_id()) {
                warn!(
                    "index was built with {:?} but queries use {}; re-run ingest",
                    manifest.embedder_id, embedder.embedder_id()
                );
            }
            let db_path = settings.data.lancedb_generation_path(&manifest.generation);
            let index = LanceDbIndexer::open(&db_path, &settings.data.table_name, embedder.dim())?;
            Some(DenseRetriever { index: Box::new(index), embedder })
        }
    };
    Ok(HybridChunkStore::new(text, dense))
}
