//! Tier 2: answer from retrieved context with a hosted chat model.
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use sbyec_core::config::{GenerationSettings, OrgProfile};

use crate::replies::CannedReplies;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model call timed out")]
    Timeout,
    #[error("credential rejected (HTTP {0})")]
    Auth(u16),
    #[error("model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not build model client: {0}")]
    Build(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else if e.is_decode() {
            GenerationError::Malformed(e.to_string())
        } else {
            GenerationError::Transport(e.to_string())
        }
    }
}

/// A single synchronous completion call.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    api_key: String,
}

impl GroqClient {
    pub fn new(settings: &GenerationSettings, api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Build(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            api_key: api_key.into(),
        })
    }
}

impl CompletionClient for GroqClient {
    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: [ChatMessage { role: "user", content: prompt }],
        };
        let resp = self.http.post(&self.endpoint).bearer_auth(&self.api_key).json(&body).send()?;
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GenerationError::Auth(status.as_u16()));
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GenerationError::Status { status: status.as_u16(), body });
        }
        let parsed: ChatResponse = serde_json::from_str(&resp.text()?).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::Malformed("no choices[0].message.content".into()))
    }
}

/// Builds the client from a resolved credential.
pub type ClientFactory = Box<dyn Fn(&str) -> Result<Box<dyn CompletionClient>, GenerationError> + Send + Sync>;

/// Owns the lazily-built model client.
///
/// The credential is resolved once at construction, so a missing key is
/// detected without any network traffic. The client itself is built on the
/// first generation and reused for the life of the fallback; concurrent first
/// callers race safely on the [`OnceCell`].
pub struct GenerativeFallback {
    api_key: Option<String>,
    factory: ClientFactory,
    client: OnceCell<Box<dyn CompletionClient>>,
    org: OrgProfile,
    replies: CannedReplies,
}

impl GenerativeFallback {
    pub fn from_settings(settings: &GenerationSettings, org: &OrgProfile) -> Self {
        let api_key = settings.resolve_api_key();
        let settings = settings.clone();
        let factory: ClientFactory = Box::new(move |key| Ok(Box::new(GroqClient::new(&settings, key)?) as Box<dyn CompletionClient>));
        Self::with_factory(api_key, factory, org)
    }

    pub fn with_factory(api_key: Option<String>, factory: ClientFactory, org: &OrgProfile) -> Self {
        Self { api_key, factory, client: OnceCell::new(), org: org.clone(), replies: CannedReplies::from(org) }
    }

    pub fn is_configured(&self) -> bool { self.api_key.is_some() }

    /// Never fails: an unavailable or failing model maps to a fixed reply.
    pub fn generate(&self, question: &str, context: &str) -> String {
        let Some(key) = self.api_key.as_deref() else {
            debug!("no generation credential; returning canned reply");
            return self.replies.no_credential.clone();
        };
        let client = match self.client.get_or_try_init(|| {
            info!("initializing generation client");
            (self.factory)(key)
        }) {
            Ok(client) => client,
            Err(e) => {
                warn!("generation client unavailable: {}", e);
                return self.replies.apology.clone();
            }
        };
        match client.complete(&render_prompt(&self.org, &self.replies, context, question)) {
            Ok(text) => text,
            Err(e) => {
                warn!("generation failed: {}", e);
                self.replies.apology.clone()
            }
        }
    }
}

pub fn render_prompt(org: &OrgProfile, replies: &CannedReplies, context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant for the {name} ({short}).\n\
         Answer based ONLY on the context below. Be direct, friendly, and concise.\n\
         If you can't find the answer, say \"{fallback}\"\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:",
        name = org.name,
        short = org.short_name,
        fallback = replies.contact_us,
    )
}
