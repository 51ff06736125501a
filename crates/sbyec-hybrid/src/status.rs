use anyhow::Result;

use sbyec_core::config::Settings;
use sbyec_core::manifest::{CorpusSnapshot, IndexManifest};

/// Whether the indexes on disk still describe the corpus.
#[derive(Debug, Clone)]
pub struct IndexStatus {
    pub manifest: Option<IndexManifest>,
    pub corpus: CorpusSnapshot,
}

impl IndexStatus {
    pub fn check(settings: &Settings) -> Result<Self> {
        Ok(Self {
            manifest: IndexManifest::load(&settings.data.manifest_path())?,
            corpus: CorpusSnapshot::scan(&settings.data.raw_txt_path())?,
        })
    }

    /// True when nothing was built yet or the corpus changed since.
    pub fn needs_refresh(&self) -> bool {
        self.manifest.as_ref().map_or(true, |m| m.is_stale(&self.corpus))
    }
}
