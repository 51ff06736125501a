use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error, warn};

use sbyec_core::config::Settings;
use sbyec_core::traits::ChunkStore;

use crate::classifier::QueryClassifier;
use crate::extractor::{Extractor, Intent};
use crate::fallback::GenerativeFallback;
use crate::replies::CannedReplies;

/// Which step produced an answer. Logged, never shown to the asker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    EmptyQuestion,
    NoPassages,
    Rules(Intent),
    Generative,
    /// Retrieval failed or something panicked; the contact reply was used.
    Fault,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub tier: Tier,
}

/// Retrieve, classify, extract, and fall back to generation.
///
/// Shared across threads: the store is read-only and the model client is
/// built at most once inside [`GenerativeFallback`].
pub struct AnswerRouter {
    store: Arc<dyn ChunkStore>,
    classifier: QueryClassifier,
    extractor: Extractor,
    fallback: GenerativeFallback,
    replies: CannedReplies,
    top_k: usize,
    context_passages: usize,
}

impl AnswerRouter {
    pub fn new(settings: &Settings, store: Arc<dyn ChunkStore>) -> Result<Self> {
        let fallback = GenerativeFallback::from_settings(&settings.generation, &settings.organization);
        Self::with_fallback(settings, store, fallback)
    }

    pub fn with_fallback(settings: &Settings, store: Arc<dyn ChunkStore>, fallback: GenerativeFallback) -> Result<Self> {
        Ok(Self {
            store,
            classifier: QueryClassifier::new()?,
            extractor: Extractor::new(settings.organization.clone(), settings.retrieval.context_passages)?,
            fallback,
            replies: CannedReplies::from(&settings.organization),
            top_k: settings.retrieval.top_k,
            context_passages: settings.retrieval.context_passages,
        })
    }

    /// Always returns a non-empty answer.
    pub fn ask(&self, question: &str) -> String {
        self.answer(question).text
    }

    pub fn answer(&self, question: &str) -> Answer {
        let answer = match catch_unwind(AssertUnwindSafe(|| self.route(question))) {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!("answering {:?} failed: {:#}", question, e);
                self.fault()
            }
            Err(_) => {
                error!("panic while answering {:?}", question);
                self.fault()
            }
        };
        debug!(tier = ?answer.tier, "answered {:?}", question);
        answer
    }

    fn route(&self, question: &str) -> Result<Answer> {
        if question.trim().is_empty() {
            return Ok(Answer { text: self.replies.ask_a_question.clone(), tier: Tier::EmptyQuestion });
        }
        let passages = self.store.search(question, self.top_k)?;
        if passages.is_empty() {
            return Ok(Answer { text: self.replies.contact_us.clone(), tier: Tier::NoPassages });
        }

        match self.classifier.matched_signal(question) {
            Some(signal) => debug!("complex question (matched {:?}); skipping rules", signal),
            None => {
                if let Some(m) = self.extractor.extract(question, &passages) {
                    return Ok(Answer { text: m.answer, tier: Tier::Rules(m.intent) });
                }
                debug!("no rule matched; escalating");
            }
        }

        let context = passages.iter().take(self.context_passages).map(|p| p.content.as_str()).collect::<Vec<_>>().join("\n\n");
        let text = self.fallback.generate(question, &context);
        if text.trim().is_empty() {
            return Ok(Answer { text: self.replies.contact_us.clone(), tier: Tier::Generative });
        }
        Ok(Answer { text, tier: Tier::Generative })
    }

    fn fault(&self) -> Answer {
        Answer { text: self.replies.contact_us.clone(), tier: Tier::Fault }
    }
}
