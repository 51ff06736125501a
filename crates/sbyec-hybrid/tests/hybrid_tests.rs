use std::fs;

use sbyec_core::config::{RetrievalMode, Settings};
use sbyec_core::traits::{ChunkStore, TextIndexer, VectorIndexer};
use sbyec_core::types::{DocumentChunk, SearchHit, SourceKind};
use sbyec_embed::FakeEmbedder;
use sbyec_hybrid::{ingest_with, open_store_with, DenseRetriever, HybridChunkStore, IndexStatus};
use tempfile::TempDir;

struct FixedHits(Vec<SearchHit>);

fn hit(id: &str, score: f32, source: SourceKind) -> SearchHit {
    SearchHit { id: id.into(), score, source, content: format!("content of {}", id) }
}

impl TextIndexer for FixedHits {
    fn index(&self, _: &[DocumentChunk]) -> anyhow::Result<()> { Ok(()) }
    fn search(&self, _: &str, k: usize) -> anyhow::Result<Vec<SearchHit>> { Ok(self.0.iter().take(k).cloned().collect()) }
}

impl VectorIndexer for FixedHits {
    fn index(&self, _: &[DocumentChunk], _: &[Vec<f32>]) -> anyhow::Result<()> { Ok(()) }
    fn search_vec(&self, _: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>> { Ok(self.0.iter().take(k).cloned().collect()) }
}

fn settings_in(dir: &TempDir, mode: RetrievalMode) -> Settings {
    let mut settings = Settings::default();
    let root = dir.path();
    settings.data.raw_txt_dir = root.join("data").to_string_lossy().to_string();
    settings.data.tantivy_index_dir = root.join("indexes/tantivy").to_string_lossy().to_string();
    settings.data.lancedb_index_dir = root.join("indexes/lancedb").to_string_lossy().to_string();
    settings.retrieval.mode = mode;
    settings
}

fn write_corpus(dir: &TempDir) {
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("contact.txt"), "Contact us\n\nPHONE: (564) 208-1315\nEMAIL: info@silverbuckleranch.org").unwrap();
    fs::write(data.join("lessons.txt"), "Riding lessons\n\nPrivate riding lessons are $65 per session for riders 6 and up.").unwrap();
}

#[test]
fn merge_keeps_best_score_per_id_and_normalizes_bm25() {
    let text = FixedHits(vec![hit("a:0", 12.0, SourceKind::Text), hit("b:0", 6.0, SourceKind::Text)]);
    let dense = FixedHits(vec![hit("b:0", 0.9, SourceKind::Vector), hit("c:0", 0.2, SourceKind::Vector)]);
    let store = HybridChunkStore::new(
        Some(Box::new(text)),
        Some(DenseRetriever { index: Box::new(dense), embedder: Box::new(FakeEmbedder::new(8)) }),
    );
    let hits = store.query("anything", 10).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["a:0", "b:0", "c:0"]);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
    assert_eq!(hits[1].source, SourceKind::Vector);
}

#[test]
fn query_truncates_to_k() {
    let store = HybridChunkStore::text_only(FixedHits(vec![
        hit("a:0", 3.0, SourceKind::Text),
        hit("b:0", 2.0, SourceKind::Text),
        hit("c:0", 1.0, SourceKind::Text),
    ]));
    assert_eq!(store.search("q", 2).unwrap().len(), 2);
    assert!(store.search("q", 0).unwrap().is_empty());
}

#[test]
fn text_mode_ingest_then_search() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);
    let settings = settings_in(&dir, RetrievalMode::Text);

    let manifest = ingest_with(&settings, None).unwrap();
    assert_eq!(manifest.file_count, 2);
    assert!(manifest.embedder_id.is_none());

    let store = open_store_with(&settings, None).unwrap();
    let passages = store.search("phone number", 5).unwrap();
    assert!(passages[0].content.contains("208-1315"), "{passages:?}");
}

#[test]
fn hybrid_ingest_with_fake_embedder() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);
    let settings = settings_in(&dir, RetrievalMode::Hybrid);
    let embedder = FakeEmbedder::new(16);

    let manifest = ingest_with(&settings, Some(&embedder)).unwrap();
    assert_eq!(manifest.embedder_id.as_deref(), Some("fake:d16"));

    let store = open_store_with(&settings, Some(Box::new(FakeEmbedder::new(16)))).unwrap();
    let passages = store.search("riding lessons", 5).unwrap();
    assert!(passages.iter().any(|p| p.content.contains("$65")));
}

#[test]
fn open_without_ingest_is_an_error() {
    let dir = TempDir::new().unwrap();
    let settings = settings_in(&dir, RetrievalMode::Text);
    assert!(open_store_with(&settings, None).is_err());
}

#[test]
fn status_tracks_corpus_changes() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);
    let settings = settings_in(&dir, RetrievalMode::Text);
    assert!(IndexStatus::check(&settings).unwrap().needs_refresh());

    ingest_with(&settings, None).unwrap();
    assert!(!IndexStatus::check(&settings).unwrap().needs_refresh());

    fs::write(dir.path().join("data/events.txt"), "Upcoming events: Halloween hay ride").unwrap();
    assert!(IndexStatus::check(&settings).unwrap().needs_refresh());
}

fn generations(root: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root).unwrap().map(|e| e.unwrap().file_name().to_string_lossy().to_string()).collect();
    names.sort();
    names
}

fn sorted(names: &[&str]) -> Vec<String> {
    let mut names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    names.sort();
    names
}

#[test]
fn reingest_leaves_live_generation_readable() {
    let dir = TempDir::new().unwrap();
    write_corpus(&dir);
    let settings = settings_in(&dir, RetrievalMode::Hybrid);
    let embedder = FakeEmbedder::new(16);

    let first = ingest_with(&settings, Some(&embedder)).unwrap();
    let live = open_store_with(&settings, Some(Box::new(FakeEmbedder::new(16)))).unwrap();

    fs::write(dir.path().join("data/events.txt"), "Upcoming events: Halloween hay ride in October").unwrap();
    let second = ingest_with(&settings, Some(&embedder)).unwrap();
    assert_ne!(first.generation, second.generation);
    assert_eq!(generations(&dir.path().join("indexes/lancedb")), sorted(&[first.generation.as_str(), second.generation.as_str()]));
    // The store opened before the second ingest still reads its own generation.
    assert!(live.search("riding lessons", 5).unwrap().iter().any(|p| p.content.contains("$65")));

    let third = ingest_with(&settings, Some(&embedder)).unwrap();
    let kept = sorted(&[second.generation.as_str(), third.generation.as_str()]);
    assert_eq!(generations(&dir.path().join("indexes/lancedb")), kept);
    assert_eq!(generations(&dir.path().join("indexes/tantivy")), kept);

    let fresh = open_store_with(&settings, Some(Box::new(FakeEmbedder::new(16)))).unwrap();
    assert!(fresh.search("halloween", 5).unwrap().iter().any(|p| p.content.contains("hay ride")));
    drop(live);
}
