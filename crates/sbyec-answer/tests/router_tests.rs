use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use sbyec_answer::fallback::ClientFactory;
use sbyec_answer::{AnswerRouter, CannedReplies, CompletionClient, Extractor, GenerationError, GenerativeFallback, Intent, Tier};
use sbyec_core::config::{OrgProfile, Settings};
use sbyec_core::traits::ChunkStore;
use sbyec_core::types::Passage;

struct StaticStore {
    passages: Vec<Passage>,
    calls: AtomicUsize,
}

impl StaticStore {
    fn new(texts: &[&str]) -> Arc<Self> {
        let passages = texts.iter().enumerate().map(|(i, t)| Passage::new(format!("p:{}", i), *t)).collect();
        Arc::new(Self { passages, calls: AtomicUsize::new(0) })
    }
}

impl ChunkStore for StaticStore {
    fn search(&self, _query: &str, k: usize) -> anyhow::Result<Vec<Passage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.passages.iter().take(k).cloned().collect())
    }
}

struct FailingStore;

impl ChunkStore for FailingStore {
    fn search(&self, _: &str, _: usize) -> anyhow::Result<Vec<Passage>> { anyhow::bail!("index offline") }
}

struct PanickingStore;

impl ChunkStore for PanickingStore {
    fn search(&self, _: &str, _: usize) -> anyhow::Result<Vec<Passage>> { panic!("corrupt passage") }
}

/// Records every prompt and answers with a fixed string or error.
struct ScriptedClient {
    prompts: Arc<Mutex<Vec<String>>>,
    reply: Result<String, u16>,
}

impl CompletionClient for ScriptedClient {
    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(GenerationError::Auth)
    }
}

struct Harness {
    prompts: Arc<Mutex<Vec<String>>>,
    builds: Arc<AtomicUsize>,
}

fn scripted_fallback(reply: Result<String, u16>) -> (GenerativeFallback, Harness) {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let builds = Arc::new(AtomicUsize::new(0));
    let (p, b) = (prompts.clone(), builds.clone());
    let factory: ClientFactory = Box::new(move |_key| {
        b.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedClient { prompts: p.clone(), reply: reply.clone() }) as Box<dyn CompletionClient>)
    });
    let fallback = GenerativeFallback::with_factory(Some("test-key".into()), factory, &OrgProfile::default());
    (fallback, Harness { prompts, builds })
}

fn router_with(store: Arc<dyn ChunkStore>, reply: Result<String, u16>) -> (AnswerRouter, Harness) {
    let (fallback, harness) = scripted_fallback(reply);
    (AnswerRouter::with_fallback(&Settings::default(), store, fallback).unwrap(), harness)
}

fn replies() -> CannedReplies { CannedReplies::default() }

const CONTACT: &str = "Contact us: PHONE: (564) 208-1315 EMAIL: info@silverbuckleranch.org";

#[test]
fn blank_questions_skip_retrieval() {
    let store = StaticStore::new(&[CONTACT]);
    let (router, harness) = router_with(store.clone(), Ok("model".into()));
    assert_eq!(router.ask(""), "Please ask a question about SBYEC!");
    assert_eq!(router.ask("   \t"), "Please ask a question about SBYEC!");
    assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.builds.load(Ordering::SeqCst), 0);
}

#[test]
fn empty_retrieval_returns_contact_reply_verbatim() {
    let (router, _) = router_with(StaticStore::new(&[]), Ok("model".into()));
    let answer = router.answer("What's your phone number?");
    assert_eq!(answer.text, replies().contact_us);
    assert_eq!(answer.tier, Tier::NoPassages);
}

#[test]
fn simple_question_answered_by_rules_without_model() {
    let store = StaticStore::new(&[CONTACT]);
    let (router, harness) = router_with(store.clone(), Ok("model".into()));
    let answer = router.answer("What's your phone number?");
    assert_eq!(answer.tier, Tier::Rules(Intent::Contact));

    let extracted = Extractor::new(OrgProfile::default(), 5)
        .unwrap()
        .extract("What's your phone number?", &store.passages)
        .expect("contact rule fires");
    assert_eq!(answer.text, extracted.answer);
    assert_eq!(answer.text, "Phone: (564) 208-1315\nEmail: info@silverbuckleranch.org");
    assert_eq!(harness.builds.load(Ordering::SeqCst), 0);
    assert!(harness.prompts.lock().unwrap().is_empty());
}

#[test]
fn complex_question_escalates_even_when_rules_would_match() {
    let (router, harness) = router_with(StaticStore::new(&[CONTACT]), Ok("Both numbers reach the office.".into()));
    let answer = router.answer("Compare phone numbers");
    assert_eq!(answer.tier, Tier::Generative);
    assert_eq!(answer.text, "Both numbers reach the office.");
    assert_eq!(harness.prompts.lock().unwrap().len(), 1);
}

#[test]
fn only_top_five_passages_reach_rules_and_prompt() {
    let texts: Vec<String> = (0..10)
        .map(|i| if i == 5 { "PHONE: (564) 208-1315".to_string() } else { format!("filler passage number {}", i) })
        .collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let (router, harness) = router_with(StaticStore::new(&refs), Ok("generated".into()));

    let answer = router.answer("phone?");
    assert_eq!(answer.tier, Tier::Generative);
    let prompts = harness.prompts.lock().unwrap();
    let prompt = &prompts[0];
    for i in 0..5 {
        assert!(prompt.contains(&format!("filler passage number {}", i)));
    }
    assert!(!prompt.contains("PHONE: (564) 208-1315"));
    assert!(prompt.contains("filler passage number 0\n\nfiller passage number 1"));
    assert!(prompt.contains("Question: phone?"));
}

#[test]
fn missing_credential_degrades_to_canned_reply() {
    let mut settings = Settings::default();
    settings.generation.api_key = None;
    settings.generation.api_key_env = "SBYEC_TEST_UNSET_KEY_VAR".into();
    let router = AnswerRouter::new(&settings, StaticStore::new(&[CONTACT])).unwrap();
    assert_eq!(router.ask("Which is better, camp or lessons?"), replies().no_credential);
}

#[test]
fn model_failure_maps_to_apology() {
    let (router, _) = router_with(StaticStore::new(&[CONTACT]), Err(401));
    assert_eq!(router.ask("Can you summarize your programs?"), replies().apology);
}

#[test]
fn blank_model_output_becomes_contact_reply() {
    let (router, _) = router_with(StaticStore::new(&[CONTACT]), Ok("  ".into()));
    assert_eq!(router.ask("What do you think of the camps?"), replies().contact_us);
}

#[test]
fn store_errors_and_panics_still_answer() {
    let (router, _) = router_with(Arc::new(FailingStore), Ok("x".into()));
    let answer = router.answer("phone?");
    assert_eq!((answer.text.as_str(), answer.tier), (replies().contact_us.as_str(), Tier::Fault));

    let (router, _) = router_with(Arc::new(PanickingStore), Ok("x".into()));
    assert_eq!(router.ask("phone?"), replies().contact_us);
}

#[test]
fn answers_are_never_empty() {
    let (router, _) = router_with(StaticStore::new(&["tiny"]), Ok(String::new()));
    for q in ["", " ", "?", "hello", "compare", "phone", "Tell me about the horses"] {
        assert!(!router.ask(q).trim().is_empty(), "empty answer for {:?}", q);
    }
}

#[test]
fn client_is_built_once_under_concurrency() {
    let (router, harness) = router_with(StaticStore::new(&[CONTACT]), Ok("generated".into()));
    let router = Arc::new(router);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let router = router.clone();
            thread::spawn(move || router.ask("Can you recommend a program?"))
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), "generated");
    }
    assert_eq!(harness.builds.load(Ordering::SeqCst), 1);
    assert_eq!(harness.prompts.lock().unwrap().len(), 8);
}
