//! Corpus freshness tracking.
//!
//! Ingest records a fingerprint of the `.txt` corpus in `manifest.json`; a
//! later scan with a different fingerprint means the indexes are stale.
//!
//! Each ingest writes its indexes into a new generation directory under the
//! index roots. The manifest names the live generation, so readers of the
//! previous one keep working until they switch over.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::data_processor::list_txt_files;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    pub file_count: usize,
    pub latest_modified: Option<DateTime<Utc>>,
    pub fingerprint: String,
}

impl CorpusSnapshot {
    pub fn scan(data_dir: &Path) -> Result<Self> {
        let files = list_txt_files(data_dir);
        let mut hasher = blake3::Hasher::new();
        let mut latest_modified: Option<DateTime<Utc>> = None;
        for file in &files {
            let relative = file.strip_prefix(data_dir).unwrap_or(file);
            hasher.update(relative.to_string_lossy().as_bytes());
            hasher.update(&[0]);
            hasher.update(&fs::read(file).with_context(|| format!("reading {}", file.display()))?);
            let modified: DateTime<Utc> = fs::metadata(file)?.modified()?.into();
            if latest_modified.map_or(true, |m| modified > m) {
                latest_modified = Some(modified);
            }
        }
        Ok(Self { file_count: files.len(), latest_modified, fingerprint: hasher.finalize().to_hex().to_string() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub built_at: DateTime<Utc>,
    pub file_count: usize,
    pub chunk_count: usize,
    pub fingerprint: String,
    pub embedder_id: Option<String>,
    /// Subdirectory of each index root holding this build; empty means the root itself.
    #[serde(default)]
    pub generation: String,
}

pub const GENERATION_PREFIX: &str = "gen-";

/// Directory name for indexes built at `built_at`.
pub fn generation_name(built_at: &DateTime<Utc>) -> String {
    format!("{}{}", GENERATION_PREFIX, built_at.format("%Y%m%dT%H%M%S%9f"))
}

impl IndexManifest {
    pub fn new(snapshot: &CorpusSnapshot, chunk_count: usize, embedder_id: Option<String>) -> Self {
        let built_at = Utc::now();
        Self {
            generation: generation_name(&built_at),
            built_at,
            file_count: snapshot.file_count,
            chunk_count,
            fingerprint: snapshot.fingerprint.clone(),
            embedder_id,
        }
    }

    /// `Ok(None)` when no index has been built yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Ok(Some(serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Readers poll this file; replace it in one rename.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    pub fn is_stale(&self, snapshot: &CorpusSnapshot) -> bool {
        self.fingerprint != snapshot.fingerprint
    }
}
