//! Tier 1: deterministic answers mined from the top passages.
//!
//! Rules are tried in table order. A rule fires when one of its trigger
//! phrases occurs in the lowercased question; the first rule that fires
//! *and* finds something wins. The catch-all [`Intent::Generic`] rule has
//! no triggers and is always tried last.
use std::fmt;

use sbyec_core::config::OrgProfile;
use sbyec_core::types::Passage;

use crate::patterns::Patterns;

/// The top passage is returned as a generic answer only above this many characters.
pub const GENERIC_MIN_CHARS: usize = 50;

const EVENT_MARKERS: &[&str] = &["event", "upcoming", "peppermint", "halloween", "spring farm", "books at"];
const ROLE_TITLES: &[&str] = &["Manager", "Instructor", "President", "Treasurer", "Secretary"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Contact,
    Email,
    Address,
    Events,
    Pricing,
    Team,
    Lessons,
    Programs,
    Generic,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Contact => "contact",
            Intent::Email => "email",
            Intent::Address => "address",
            Intent::Events => "events",
            Intent::Pricing => "pricing",
            Intent::Team => "team",
            Intent::Lessons => "lessons",
            Intent::Programs => "programs",
            Intent::Generic => "generic",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMatch {
    pub intent: Intent,
    pub answer: String,
}

/// What every rule sees: the truncated passages and their concatenation.
pub struct Evidence<'a> {
    pub passages: Vec<&'a str>,
    pub combined: String,
    pub patterns: &'a Patterns,
    pub org: &'a OrgProfile,
}

pub type RuleFn = fn(&Evidence<'_>) -> Option<String>;

#[derive(Clone)]
pub struct IntentRule {
    pub intent: Intent,
    pub triggers: &'static [&'static str],
    pub extract: RuleFn,
}

impl IntentRule {
    pub fn fires(&self, lowered_question: &str) -> bool {
        self.triggers.is_empty() || self.triggers.iter().any(|t| lowered_question.contains(t))
    }
}

impl fmt::Debug for IntentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntentRule").field("intent", &self.intent).field("triggers", &self.triggers).finish()
    }
}

/// The rule table in priority order.
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule { intent: Intent::Contact, triggers: &["phone", "call", "number", "contact", "reach"], extract: contact },
        IntentRule { intent: Intent::Email, triggers: &["email", "mail"], extract: email },
        IntentRule {
            intent: Intent::Address,
            triggers: &["address", "location", "where", "located", "directions", "find you"],
            extract: address,
        },
        IntentRule { intent: Intent::Events, triggers: &["event", "upcoming", "happening", "schedule", "when"], extract: events },
        IntentRule { intent: Intent::Pricing, triggers: &["cost", "price", "how much", "fee", "pricing"], extract: pricing },
        IntentRule { intent: Intent::Team, triggers: &["team", "staff", "instructor", "board", "who works"], extract: team },
        IntentRule { intent: Intent::Lessons, triggers: &["lesson", "riding", "class", "learn to ride"], extract: lessons },
        IntentRule {
            intent: Intent::Programs,
            triggers: &["program", "camp", "volunteer", "field trip", "books", "encounter"],
            extract: programs,
        },
        IntentRule { intent: Intent::Generic, triggers: &[], extract: generic },
    ]
}

#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Vec<IntentRule>,
    patterns: Patterns,
    org: OrgProfile,
    max_passages: usize,
}

impl Extractor {
    pub fn new(org: OrgProfile, max_passages: usize) -> Result<Self, regex::Error> {
        Ok(Self { rules: default_rules(), patterns: Patterns::new()?, org, max_passages })
    }

    pub fn rules(&self) -> &[IntentRule] { &self.rules }

    /// `None` is the normal "no rule could answer" outcome.
    pub fn extract(&self, question: &str, passages: &[Passage]) -> Option<IntentMatch> {
        let q = question.to_lowercase();
        let top: Vec<&str> = passages.iter().take(self.max_passages).map(|p| p.content.as_str()).collect();
        let evidence = Evidence { combined: top.join("\n\n"), passages: top, patterns: &self.patterns, org: &self.org };
        self.rules
            .iter()
            .filter(|rule| rule.fires(&q))
            .find_map(|rule| (rule.extract)(&evidence).filter(|a| !a.is_empty()).map(|answer| IntentMatch { intent: rule.intent, answer }))
    }
}

fn first_passage_where(evidence: &Evidence<'_>, pred: impl Fn(&str) -> bool) -> Option<String> {
    evidence.passages.iter().find(|p| pred(p)).map(|p| p.trim().to_string())
}

fn contact(e: &Evidence<'_>) -> Option<String> {
    let phone = e.patterns.first_phone(&e.combined);
    let email = e.patterns.unique_emails(&e.combined).into_iter().next();
    let lines: Vec<String> = [phone.map(|p| format!("Phone: {}", p)), email.map(|m| format!("Email: {}", m))].into_iter().flatten().collect();
    if lines.is_empty() { None } else { Some(lines.join("\n")) }
}

fn email(e: &Evidence<'_>) -> Option<String> {
    let emails = e.patterns.unique_emails(&e.combined);
    if emails.is_empty() { return None; }
    Some(format!("Email: {}", emails.iter().take(3).copied().collect::<Vec<_>>().join(", ")))
}

fn address(e: &Evidence<'_>) -> Option<String> {
    if let Some(addr) = e.patterns.first_address(&e.combined) {
        return Some(format!("Address: {}", addr));
    }
    if !e.org.address_marker.is_empty() && e.combined.contains(&e.org.address_marker) {
        return Some(format!("Address: {}", e.org.address));
    }
    None
}

fn events(e: &Evidence<'_>) -> Option<String> {
    first_passage_where(e, |p| {
        let lowered = p.to_lowercase();
        EVENT_MARKERS.iter().any(|m| lowered.contains(m))
    })
}

fn pricing(e: &Evidence<'_>) -> Option<String> {
    if !e.patterns.has_price(&e.combined) { return None; }
    first_passage_where(e, |p| p.contains('$'))
}

// Role titles are matched case-sensitively.
fn team(e: &Evidence<'_>) -> Option<String> {
    first_passage_where(e, |p| ROLE_TITLES.iter().any(|t| p.contains(t)))
}

fn lessons(e: &Evidence<'_>) -> Option<String> {
    first_passage_where(e, |p| {
        let lowered = p.to_lowercase();
        lowered.contains("lesson") || lowered.contains("riding")
    })
}

fn programs(e: &Evidence<'_>) -> Option<String> {
    e.passages.first().map(|p| p.trim().to_string())
}

fn generic(e: &Evidence<'_>) -> Option<String> {
    let top = e.passages.first()?.trim();
    (top.chars().count() > GENERIC_MIN_CHARS).then(|| top.to_string())
}
