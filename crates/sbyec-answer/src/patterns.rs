//! Structured-field patterns used by the extraction rules.
use regex::Regex;

pub const PHONE: &str = r"\(?\d{3}\)?[\s\-]?\d{3}[\s\-]?\d{4}";
pub const EMAIL: &str = r"[\w.+-]+@[\w-]+\.[\w.]+";
/// `<number> NE <street> Avenue..., <city>, <ST> <zip>`
pub const ADDRESS: &str = r"\d+\s+NE\s+\d+\w*\s+Avenue[^,]*,\s*\w[\w\s]*,\s*\w{2}\s+\d{5}";
/// `$65`, `$12.50`, `$400/month`
pub const PRICE: &str = r"\$\d+(?:\.\d{2})?(?:/\w+)?";

/// Compiled once per router; read-only afterwards.
#[derive(Debug, Clone)]
pub struct Patterns {
    pub phone: Regex,
    pub email: Regex,
    pub address: Regex,
    pub price: Regex,
}

impl Patterns {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self { phone: Regex::new(PHONE)?, email: Regex::new(EMAIL)?, address: Regex::new(ADDRESS)?, price: Regex::new(PRICE)? })
    }

    pub fn first_phone<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.phone.find(text).map(|m| m.as_str())
    }

    /// Every email in `text`, first occurrence order, no duplicates.
    pub fn unique_emails<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut seen = Vec::new();
        for m in self.email.find_iter(text) {
            if !seen.contains(&m.as_str()) {
                seen.push(m.as_str());
            }
        }
        seen
    }

    pub fn first_address<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.address.find(text).map(|m| m.as_str())
    }

    pub fn has_price(&self, text: &str) -> bool {
        self.price.is_match(text)
    }
}
