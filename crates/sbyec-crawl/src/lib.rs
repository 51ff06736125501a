//! Fixed-page crawler that turns the public site into the `.txt` corpus.
pub mod extract;

use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use sbyec_core::config::{CrawlerSettings, OrgProfile};

pub use extract::{extract_content, FooterFacts};

pub const SITE_CONTENT_FILE: &str = "sbyec_website_content.txt";
pub const EVENTS_FILE: &str = "sbyec_events.txt";

pub(crate) const RULE: &str = "======================================================================";

pub struct SiteCrawler {
    settings: CrawlerSettings,
    footer: FooterFacts,
    http: reqwest::blocking::Client,
    output_dir: PathBuf,
    visited: HashSet<String>,
}

impl SiteCrawler {
    pub fn new(settings: &CrawlerSettings, org: &OrgProfile, output_dir: &Path) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        fs::create_dir_all(output_dir)?;
        Ok(Self {
            settings: settings.clone(),
            footer: FooterFacts::from(org),
            http,
            output_dir: output_dir.to_path_buf(),
            visited: HashSet::new(),
        })
    }

    /// Page body, or `None` after logging a network or HTTP failure.
    pub fn fetch_page(&self, url: &str) -> Option<String> {
        let fetched = self.http.get(url).send().and_then(|r| r.error_for_status()).and_then(|r| r.text());
        match fetched {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("Error fetching {}: {}", url, e);
                None
            }
        }
    }

    /// Fetch and extract one site path; already visited URLs are skipped.
    pub fn crawl_page(&mut self, path: &str) -> Option<String> {
        let url = join_url(&self.settings.base_url, path);
        if !self.visited.insert(url.clone()) {
            return None;
        }
        info!("Crawling: {}", path);
        let html = self.fetch_page(&url)?;
        let block = extract_content(&html, &url, &self.footer);
        if self.settings.delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.settings.delay_ms));
        }
        block
    }

    /// Crawl every configured page into one file. Returns its path.
    pub fn crawl_all(&mut self) -> Result<PathBuf> {
        let start = Instant::now();
        info!("Crawling {} pages from {}", self.settings.pages.len(), self.settings.base_url);
        let pages = self.settings.pages.clone();
        let sections: Vec<String> = pages.iter().filter_map(|p| self.crawl_page(p)).collect();

        let out = self.output_dir.join(SITE_CONTENT_FILE);
        let header = format!("SBYEC Website Content - Last Crawled: {}\n{}\n\n", now_stamp(), RULE);
        fs::write(&out, header + &sections.join("\n"))?;
        info!(
            "Crawled {} pages into {} sections in {:.2?}; saved to {}",
            self.visited.len(),
            sections.len(),
            start.elapsed(),
            out.display()
        );
        Ok(out)
    }

    /// Refresh only the events page. `Ok(None)` when it could not be fetched.
    pub fn crawl_events_only(&mut self) -> Result<Option<PathBuf>> {
        let events_page = self.settings.events_page.clone();
        let Some(block) = self.crawl_page(&events_page) else {
            warn!("Failed to fetch events");
            return Ok(None);
        };
        let out = self.output_dir.join(EVENTS_FILE);
        fs::write(&out, block)?;
        info!("Events updated: {}", out.display());
        Ok(Some(out))
    }
}

pub(crate) fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
