use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

use sbyec_answer::AnswerRouter;

use crate::loader::RouterLoader;

/// The live router plus what is needed to replace it.
///
/// Every method blocks (ingest, retrieval, model calls); async callers
/// must go through `spawn_blocking`. Swapped-out routers are dropped on
/// the calling thread, so that thread must not be a runtime worker.
#[derive(Clone)]
pub struct AppState(Arc<Shared>);

struct Shared {
    loader: Arc<dyn RouterLoader>,
    router: RwLock<Arc<AnswerRouter>>,
    last_loaded: RwLock<DateTime<Utc>>,
    rebuild: Mutex<()>,
    service: String,
}

impl AppState {
    pub fn new(loader: Arc<dyn RouterLoader>, router: AnswerRouter, service: impl Into<String>) -> Self {
        Self(Arc::new(Shared {
            loader,
            router: RwLock::new(Arc::new(router)),
            last_loaded: RwLock::new(Utc::now()),
            rebuild: Mutex::new(()),
            service: service.into(),
        }))
    }

    pub fn service(&self) -> &str { &self.0.service }

    pub fn last_loaded(&self) -> DateTime<Utc> {
        *self.0.last_loaded.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn updates_available(&self) -> Result<bool> { self.0.loader.updates_available() }

    /// Rebuild and swap in a new router. Concurrent refreshes run one at a time.
    pub fn refresh(&self) -> Result<()> {
        let _guard = self.0.rebuild.lock().unwrap_or_else(PoisonError::into_inner);
        self.swap_in_rebuilt()
    }

    /// Refresh unless another caller already did while this one waited for
    /// the rebuild lock.
    fn refresh_if_stale(&self) -> Result<()> {
        let _guard = self.0.rebuild.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.0.loader.updates_available()? {
            debug!("Knowledge base already current");
            return Ok(());
        }
        self.swap_in_rebuilt()
    }

    // Caller holds `rebuild`.
    fn swap_in_rebuilt(&self) -> Result<()> {
        info!("Refreshing knowledge base");
        let fresh = Arc::new(self.0.loader.rebuild()?);
        let previous = std::mem::replace(&mut *self.0.router.write().unwrap_or_else(PoisonError::into_inner), fresh);
        *self.0.last_loaded.write().unwrap_or_else(PoisonError::into_inner) = Utc::now();
        drop(previous);
        info!("Knowledge base refreshed");
        Ok(())
    }

    /// Answer `question`, first refreshing when asked to and the corpus changed.
    /// A failed refresh is logged and the current router answers anyway.
    pub fn ask(&self, question: &str, auto_refresh: bool) -> String {
        if auto_refresh {
            match self.updates_available() {
                Ok(true) => {
                    info!("New content detected, refreshing knowledge base");
                    if let Err(e) = self.refresh_if_stale() {
                        warn!("auto-refresh failed: {:#}", e);
                    }
                }
                Ok(false) => {}
                Err(e) => warn!("could not check for updates: {:#}", e),
            }
        }
        let router = self.0.router.read().unwrap_or_else(PoisonError::into_inner).clone();
        router.ask(question)
    }
}
