use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::time::Instant;
use tracing::{debug, info, warn};

use sbyec_core::config::{DataSettings, RetrievalMode, Settings};
use sbyec_core::data_processor::DataProcessor;
use sbyec_core::manifest::{CorpusSnapshot, IndexManifest, GENERATION_PREFIX};
use sbyec_core::traits::{Embedder, TextIndexer, VectorIndexer};
use sbyec_core::types::DocumentChunk;
use sbyec_embed::get_default_embedder;
use sbyec_text::TantivyIndexer;
use sbyec_vector::LanceDbIndexer;

const EMBED_BATCH: usize = 64;

/// Rebuild every index from the `.txt` corpus and record a fresh manifest.
pub fn ingest(settings: &Settings) -> Result<IndexManifest> {
    let embedder = match settings.retrieval.mode {
        RetrievalMode::Text => None,
        _ => Some(get_default_embedder()?),
    };
    ingest_with(settings, embedder.as_deref())
}

/// Like [`ingest`] with a caller-supplied embedder. The BM25 index is always
/// built; vectors only when an embedder is given.
///
/// The new indexes go into a fresh generation directory and the manifest is
/// switched over last, so routers opened on the live generation keep
/// answering throughout. Generations older than the live one are removed
/// first.
pub fn ingest_with(settings: &Settings, embedder: Option<&dyn Embedder>) -> Result<IndexManifest> {
    let start = Instant::now();
    let data_dir = settings.data.raw_txt_path();
    info!("Ingesting corpus from {}", data_dir.display());
    let snapshot = CorpusSnapshot::scan(&data_dir)?;
    let chunks = DataProcessor::new(&settings.chunking).process_directory(&data_dir)?;

    match IndexManifest::load(&settings.data.manifest_path()) {
        Ok(live) => prune_generations(&settings.data, live.as_ref().map(|m| m.generation.as_str())),
        Err(e) => warn!("not pruning old indexes, manifest unreadable: {:#}", e),
    }

    let manifest = IndexManifest::new(&snapshot, chunks.len(), embedder.map(|e| e.embedder_id().to_string()));
    let text = TantivyIndexer::create(&settings.data.tantivy_generation_path(&manifest.generation))?;
    text.index(&chunks)?;

    if let Some(embedder) = embedder {
        let vectors = embed_all(embedder, &chunks)?;
        let db_path = settings.data.lancedb_generation_path(&manifest.generation);
        let table = LanceDbIndexer::create(&db_path, &settings.data.table_name, embedder.dim())?;
        table.index(&chunks, &vectors)?;
    }

    manifest.save(&settings.data.manifest_path())?;
    info!(
        "Ingested {} files into {} passages ({}) in {:.1?}",
        snapshot.file_count, chunks.len(), manifest.generation, start.elapsed()
    );
    Ok(manifest)
}

/// Remove every generation directory under both index roots except `keep`.
fn prune_generations(data: &DataSettings, keep: Option<&str>) {
    for root in [data.tantivy_path(), data.lancedb_path()] {
        let Ok(entries) = fs::read_dir(&root) else { continue };
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(GENERATION_PREFIX) || keep == Some(name.as_str()) {
                continue;
            }
            match fs::remove_dir_all(entry.path()) {
                Ok(()) => debug!("Removed index generation {}", entry.path().display()),
                Err(e) => warn!("could not remove {}: {}", entry.path().display(), e),
            }
        }
    }
}

fn embed_all(embedder: &dyn Embedder, chunks: &[DocumentChunk]) -> Result<Vec<Vec<f32>>> {
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} embedded")?.progress_chars("#>-"));
    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(EMBED_BATCH) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        vectors.extend(embedder.embed_batch(&texts)?);
        pb.inc(batch.len() as u64);
    }
    pb.finish_and_clear();
    Ok(vectors)
}
