use regex::{Regex, RegexBuilder};

/// Phrases that mark a question as needing reasoning rather than lookup.
/// Matched anywhere in the question, case-insensitively.
pub const COMPLEX_SIGNALS: &[&str] = &[
    "compare",
    "summarize",
    "summary",
    "explain why",
    "difference between",
    "recommend",
    "opinion",
    "which is better",
    "pros and cons",
    "what do you think",
    r"how does.*differ",
    "advantages",
];

#[derive(Debug, Clone)]
pub struct QueryClassifier {
    pattern: Regex,
}

impl QueryClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_signals(COMPLEX_SIGNALS)
    }

    pub fn with_signals(signals: &[&str]) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(&signals.join("|")).case_insensitive(true).build()?;
        Ok(Self { pattern })
    }

    pub fn is_complex(&self, question: &str) -> bool {
        self.pattern.is_match(question)
    }

    /// The first complexity phrase found in `question`, for logging.
    pub fn matched_signal<'q>(&self, question: &'q str) -> Option<&'q str> {
        self.pattern.find(question).map(|m| m.as_str())
    }
}
