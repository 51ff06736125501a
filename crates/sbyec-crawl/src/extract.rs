use scraper::{ElementRef, Html, Selector};

use sbyec_core::config::OrgProfile;

/// Elements whose text never reaches the corpus.
const SKIPPED: &[&str] = &["script", "style", "nav", "header", "iframe", "noscript"];

/// Contact facts promoted to the top of every page whose footer hints at them.
#[derive(Debug, Clone)]
pub struct FooterFacts {
    address_markers: Vec<String>,
    phone_markers: Vec<String>,
    email_marker: String,
    address_line: String,
    phone_line: String,
    email_line: String,
}

impl From<&OrgProfile> for FooterFacts {
    fn from(org: &OrgProfile) -> Self {
        // "11611 NE 152nd Avenue, Brush Prairie, WA 98606" -> ["11611", "Brush Prairie"]
        let locality = org.address.split(',').nth(1).map(str::trim).unwrap_or_default();
        let address_markers = [org.address_marker.as_str(), locality].iter().filter(|m| !m.is_empty()).map(|m| m.to_string()).collect();
        // "(564) 208-1315" -> ["564", "208-1315"]
        let phone_markers = org
            .phone
            .split(|c: char| c == '(' || c == ')' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        let email_marker = org.email.split('@').next().map(|local| format!("{}@", local)).unwrap_or_default();
        Self {
            address_markers,
            phone_markers,
            email_marker,
            address_line: format!("ADDRESS: {}", org.address),
            phone_line: format!("PHONE: {}", org.phone),
            email_line: format!("EMAIL: {}", org.email),
        }
    }
}

impl FooterFacts {
    fn lines_for(&self, footer_text: &str) -> Vec<&str> {
        let mut lines = Vec::new();
        if self.address_markers.iter().any(|m| footer_text.contains(m.as_str())) {
            lines.push(self.address_line.as_str());
        }
        if self.phone_markers.iter().any(|m| footer_text.contains(m.as_str())) {
            lines.push(self.phone_line.as_str());
        }
        if !self.email_marker.is_empty() && footer_text.contains(&self.email_marker) {
            lines.push(self.email_line.as_str());
        }
        lines
    }
}

/// Turn one page into a corpus block:
///
/// ```text
/// =====...
/// PAGE: <title>
/// URL: <url>
/// LAST UPDATED: <local time>
/// =====...
///
/// <footer facts>
///
/// <body text, one trimmed line per text run>
/// ```
///
/// `None` when the document has no `<body>`.
pub fn extract_content(html: &str, url: &str, facts: &FooterFacts) -> Option<String> {
    let document = Html::parse_document(html);

    let footer_lines = select_first(&document, "footer").map(|footer| facts.lines_for(&footer.text().collect::<String>())).unwrap_or_default();
    let title = select_first(&document, "title").map(|t| t.text().collect::<String>().trim().to_string()).unwrap_or_else(|| "No Title".to_string());
    let body = select_first(&document, "body")?;

    let mut content = visible_lines(body).join("\n");
    if !footer_lines.is_empty() {
        content = format!("{}\n\n{}", footer_lines.join("\n"), content);
    }
    let rule = crate::RULE;
    Some(format!("\n{rule}\nPAGE: {title}\nURL: {url}\nLAST UPDATED: {}\n{rule}\n\n{content}\n\n", crate::now_stamp()))
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

fn visible_lines(root: ElementRef<'_>) -> Vec<String> {
    root.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| a.value().as_element().is_some_and(|e| SKIPPED.contains(&e.name())));
            (!hidden).then_some(&**text)
        })
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
