//! sbyec-answer
//!
//! Two-tier question answering over retrieved passages. Simple questions
//! are answered by an ordered table of extraction rules; complex questions,
//! and simple ones no rule can answer, go to a hosted language model.
//! [`AnswerRouter::ask`] always returns a non-empty string.
pub mod classifier;
pub mod extractor;
pub mod fallback;
pub mod patterns;
pub mod replies;
pub mod router;

pub use classifier::QueryClassifier;
pub use extractor::{Extractor, Intent, IntentMatch};
pub use fallback::{CompletionClient, GenerationError, GenerativeFallback, GroqClient};
pub use replies::CannedReplies;
pub use router::{Answer, AnswerRouter, Tier};
