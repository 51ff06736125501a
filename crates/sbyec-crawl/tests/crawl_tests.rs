use sbyec_core::config::{CrawlerSettings, OrgProfile};
use sbyec_crawl::{SiteCrawler, EVENTS_FILE, SITE_CONTENT_FILE};
use tempfile::TempDir;

fn page(title: &str, body: &str) -> String {
    format!("<html><head><title>{title}</title></head><body><p>{body}</p><footer>(564) 208-1315</footer></body></html>")
}

fn settings_for(server: &mockito::Server, pages: &[&str]) -> CrawlerSettings {
    CrawlerSettings {
        base_url: server.url(),
        pages: pages.iter().map(|p| p.to_string()).collect(),
        delay_ms: 0,
        timeout_secs: 5,
        ..CrawlerSettings::default()
    }
}

#[test]
fn crawl_all_writes_one_block_per_page() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/").with_status(200).with_body(page("Home", "Welcome riders")).create();
    server.mock("GET", "/events/").with_status(200).with_body(page("Events", "Halloween Hay Ride")).create();
    server.mock("GET", "/missing/").with_status(404).create();

    let out = TempDir::new().unwrap();
    let settings = settings_for(&server, &["/", "/events/", "/missing/", "/"]);
    let mut crawler = SiteCrawler::new(&settings, &OrgProfile::default(), out.path()).unwrap();
    let path = crawler.crawl_all().unwrap();

    assert_eq!(path, out.path().join(SITE_CONTENT_FILE));
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("SBYEC Website Content - Last Crawled: "));
    assert_eq!(text.matches("PAGE: ").count(), 2);
    assert!(text.contains("PAGE: Home"));
    assert!(text.contains("PHONE: (564) 208-1315\n\nHalloween Hay Ride"));
}

#[test]
fn events_only_writes_events_file() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/events/").with_status(200).with_body(page("Events", "Peppermints and Ponies")).create();

    let out = TempDir::new().unwrap();
    let settings = settings_for(&server, &[]);
    let mut crawler = SiteCrawler::new(&settings, &OrgProfile::default(), out.path()).unwrap();
    let path = crawler.crawl_events_only().unwrap().unwrap();
    assert_eq!(path, out.path().join(EVENTS_FILE));
    assert!(std::fs::read_to_string(path).unwrap().contains("Peppermints and Ponies"));
}

#[test]
fn failed_events_fetch_is_not_an_error() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/events/").with_status(500).create();
    let out = TempDir::new().unwrap();
    let mut crawler = SiteCrawler::new(&settings_for(&server, &[]), &OrgProfile::default(), out.path()).unwrap();
    assert!(crawler.crawl_events_only().unwrap().is_none());
    assert!(!out.path().join(EVENTS_FILE).exists());
}
