use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use sbyec_answer::AnswerRouter;
use sbyec_core::config::{RetrievalMode, Settings};
use sbyec_core::traits::Embedder;
use sbyec_embed::get_default_embedder;
use sbyec_hybrid::{ingest_with, open_store_with, IndexStatus};

/// Produces routers over the on-disk indexes.
pub trait RouterLoader: Send + Sync {
    /// Re-ingest the corpus and open a router over the fresh indexes.
    fn rebuild(&self) -> Result<AnswerRouter>;
    /// The corpus changed since the last ingest, or nothing was built yet.
    fn updates_available(&self) -> Result<bool>;
}

type EmbedderFactory = Box<dyn Fn() -> Result<Box<dyn Embedder>> + Send + Sync>;

pub struct IndexLoader {
    settings: Settings,
    embedder: EmbedderFactory,
}

impl IndexLoader {
    pub fn new(settings: Settings) -> Self { Self::with_embedder(settings, get_default_embedder) }

    pub fn with_embedder(
        settings: Settings,
        embedder: impl Fn() -> Result<Box<dyn Embedder>> + Send + Sync + 'static,
    ) -> Self {
        Self { settings, embedder: Box::new(embedder) }
    }

    /// Open the existing indexes, ingesting first when they are missing or stale.
    pub fn load(&self) -> Result<AnswerRouter> {
        if self.updates_available()? {
            info!("Index missing or out of date; ingesting");
            return self.rebuild();
        }
        self.open(self.embedder()?)
    }

    fn embedder(&self) -> Result<Option<Box<dyn Embedder>>> {
        match self.settings.retrieval.mode {
            RetrievalMode::Text => Ok(None),
            _ => Ok(Some((self.embedder)()?)),
        }
    }

    fn open(&self, embedder: Option<Box<dyn Embedder>>) -> Result<AnswerRouter> {
        let store = open_store_with(&self.settings, embedder)?;
        AnswerRouter::new(&self.settings, Arc::new(store))
    }
}

impl RouterLoader for IndexLoader {
    fn rebuild(&self) -> Result<AnswerRouter> {
        let embedder = self.embedder()?;
        ingest_with(&self.settings, embedder.as_deref())?;
        self.open(embedder)
    }

    fn updates_available(&self) -> Result<bool> {
        Ok(IndexStatus::check(&self.settings)?.needs_refresh())
    }
}
