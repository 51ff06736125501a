use sbyec_core::config::OrgProfile;

/// Fixed user-facing strings. Each one that reports a failure names a way
/// to reach a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedReplies {
    pub ask_a_question: String,
    pub contact_us: String,
    pub no_credential: String,
    pub apology: String,
}

impl From<&OrgProfile> for CannedReplies {
    fn from(org: &OrgProfile) -> Self {
        Self {
            ask_a_question: format!("Please ask a question about {}!", org.short_name),
            contact_us: format!("For the most up-to-date information, please call {} or email {}", org.phone, org.email),
            no_credential: format!("For more detailed information, please call {} or email {}", org.phone, org.email),
            apology: format!("Sorry, I'm temporarily unable to provide a detailed answer. Please call {}.", org.phone),
        }
    }
}

impl Default for CannedReplies {
    fn default() -> Self { Self::from(&OrgProfile::default()) }
}
