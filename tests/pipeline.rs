//! End-to-end runs against in-memory sites and a temporary data directory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kjpp_monitor::error::{AppError, Result};
use kjpp_monitor::models::Config;
use kjpp_monitor::pipeline::run_monitor;
use kjpp_monitor::services::{Notifier, NotifyOutcome, PageFetcher};
use kjpp_monitor::storage::LocalStorage;
use tempfile::TempDir;

/// Serves fixed bodies; unknown URLs answer 404.
#[derive(Default)]
struct StubSite {
    pages: Mutex<HashMap<String, String>>,
}

impl StubSite {
    fn serve(&self, url: &str, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }
}

#[async_trait]
impl PageFetcher for StubSite {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::fetch(url, "HTTP status client error (404 Not Found)"))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> NotifyOutcome {
        self.messages.lock().unwrap().push(message.to_string());
        NotifyOutcome { sent: 1, failed: 0 }
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.fetch.source_delay_ms = 0;
    config.fetch.page_delay_ms = 0;
    config
}

fn read(dir: &TempDir, name: &str) -> String {
    std::fs::read_to_string(dir.path().join(name)).unwrap()
}

/// Export body without the timestamped header.
fn blocks(export: &str) -> &str {
    export.split_once("\n\n").map(|(_, rest)| rest).unwrap()
}

fn listing(physician_title: &str) -> String {
    format!(
        r#"<html><head>
        <script type="application/ld+json">
          {{"@context": "https://schema.org", "@type": "JobPosting",
            "title": "{physician_title}", "url": "https://x.test/jobs/1"}}
        </script></head>
        <body>
          <div class="job-item">
            <h3>Psychologin (m/w/d) Station für Jugendliche</h3>
            <a href="/jobs/2">Mehr erfahren</a>
          </div>
        </body></html>"#
    )
}

const ASSISTENZARZT: &str = "Assistenzarzt (m/w/d) Kinder- und Jugendpsychiatrie";

fn serve_listing(site: &StubSite, physician_title: &str) {
    let page = listing(physician_title);
    site.serve("https://x.test/jobs", &page);
    site.serve("https://x.test/jobs?page=2", &page);
}

#[tokio::test]
async fn empty_body_yields_single_warning_and_no_notification() {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path(), "state.json");
    let site = Arc::new(StubSite::default());
    site.serve("https://leer.test/", "");
    let notifier = RecordingNotifier::default();

    let summary = run_monitor(
        &config(),
        &["https://leer.test/".to_string()],
        site,
        &storage,
        Some(&notifier),
    )
    .await
    .unwrap();

    assert_eq!(summary.failed_sources, 1);
    assert!(notifier.messages().is_empty());

    for name in ["last_results.txt", "last_new_results.txt"] {
        let export = read(&dir, name);
        let body = blocks(&export);
        assert_eq!(body.matches("• [").count(), 1, "{name}");
        assert!(body.starts_with("• [WARN] Empty response from https://leer.test/"), "{name}");
        assert!(body.ends_with("\n  https://leer.test/\n"), "{name}");
    }
}

#[tokio::test]
async fn physician_role_ranks_first_everywhere() {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path(), "state.json");
    let site = Arc::new(StubSite::default());
    serve_listing(&site, ASSISTENZARZT);
    let notifier = RecordingNotifier::default();

    let summary = run_monitor(
        &config(),
        &["https://x.test/jobs".to_string()],
        site,
        &storage,
        Some(&notifier),
    )
    .await
    .unwrap();

    assert_eq!(summary.matches, 2);
    assert_eq!(summary.new_matches, 2);

    let expected_first =
        format!("• [PHYSICIAN_ROLE] {ASSISTENZARZT}\n  https://x.test/jobs/1\n• [RELATED_ROLE]");
    for name in ["last_results.txt", "last_new_results.txt"] {
        let export = read(&dir, name);
        assert!(blocks(&export).starts_with(&expected_first), "{name}: {export}");
    }

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    let body = &messages[0];
    let physician = body.find("KJPP-Arztstellen").unwrap();
    let related = body.find("Verwandte Positionen").unwrap();
    let title = body.find(ASSISTENZARZT).unwrap();
    assert!(physician < title && title < related);
}

#[tokio::test]
async fn novelty_survives_runs_and_title_changes_renotify() {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path(), "state.json");
    let site = Arc::new(StubSite::default());
    serve_listing(&site, ASSISTENZARZT);
    let notifier = RecordingNotifier::default();
    let urls = vec!["https://x.test/jobs".to_string()];
    let fetcher: Arc<dyn PageFetcher> = site.clone();

    let first = run_monitor(&config(), &urls, Arc::clone(&fetcher), &storage, Some(&notifier))
        .await
        .unwrap();
    assert_eq!(first.new_matches, 2);

    let state: HashMap<String, f64> =
        serde_json::from_str(&read(&dir, "state.json")).unwrap();
    assert_eq!(state.len(), 2);
    assert!(state.keys().all(|k| k.len() == 24));

    // Same content: nothing new, no message.
    let second = run_monitor(&config(), &urls, Arc::clone(&fetcher), &storage, Some(&notifier))
        .await
        .unwrap();
    assert_eq!(second.new_matches, 0);
    assert_eq!(notifier.messages().len(), 1);
    assert_eq!(
        blocks(&read(&dir, "last_new_results.txt")),
        "(keine Treffer)\n"
    );
    assert!(read(&dir, "last_results.txt").contains(ASSISTENZARZT));

    // Same URL, different title: reported again.
    let retitled = "Assistenzärztin (m/w/d) Kinder- und Jugendpsychiatrie, Teilzeit";
    serve_listing(&site, retitled);
    let third = run_monitor(&config(), &urls, fetcher, &storage, Some(&notifier))
        .await
        .unwrap();
    assert_eq!(third.new_matches, 1);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].contains(retitled));
    assert!(!messages[1].contains("Psychologin"));
}

#[tokio::test]
async fn corrupt_state_reports_everything_once_more() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("state.json"), "{ this is not json").unwrap();
    let storage = LocalStorage::new(dir.path(), "state.json");
    let site = Arc::new(StubSite::default());
    serve_listing(&site, ASSISTENZARZT);

    let summary = run_monitor(
        &config(),
        &["https://x.test/jobs".to_string()],
        site,
        &storage,
        None,
    )
    .await
    .unwrap();

    assert_eq!(summary.new_matches, 2);
    assert!(summary.state_saved);
    let state: HashMap<String, f64> =
        serde_json::from_str(&read(&dir, "state.json")).unwrap();
    assert_eq!(state.len(), 2);
}
