// src/pipeline/run.rs

//! One monitoring run: scan, classify, track, export, notify.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};

use super::novelty::NoveltyTracker;
use super::report::{ReportLine, Reporter, RunReport};
use crate::error::Result;
use crate::models::Config;
use crate::services::{Classifier, Notifier, NotifyOutcome, PageFetcher, SourceScanner, Taxonomy};
use crate::storage::{RunStorage, epoch_seconds};

/// Counters and ranked lines of a finished run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub sources: usize,
    pub failed_sources: usize,
    pub pages: usize,
    pub candidates: usize,
    pub matches: usize,
    pub new_matches: usize,
    /// Isolated block or later-page failures
    pub block_failures: usize,
    pub state_saved: bool,
    pub exports_written: usize,
    /// `None` when nothing was sent
    pub notification: Option<NotifyOutcome>,
    pub report: RunReport,
}

/// Run the monitor over `urls`, strictly one source after another.
///
/// Source failures become warning lines; only configuration problems
/// (invalid patterns or selectors) abort the run, and they do so before
/// any request is made.
pub async fn run_monitor(
    config: &Config,
    urls: &[String],
    fetcher: Arc<dyn PageFetcher>,
    storage: &dyn RunStorage,
    notifier: Option<&dyn Notifier>,
) -> Result<RunSummary> {
    let taxonomy = Arc::new(Taxonomy::compile(&config.taxonomy)?);
    let classifier = Classifier::new(&taxonomy);
    let scanner = SourceScanner::new(config, &taxonomy, fetcher)?;
    let reporter = Reporter::new(config.export.clone(), config.notify.include_related);
    let source_delay = Duration::from_millis(config.fetch.source_delay_ms);

    let mut tracker = NoveltyTracker::load(storage).await;
    let mut summary = RunSummary {
        sources: urls.len(),
        ..RunSummary::default()
    };

    log::info!("Monitoring {} URLs...", urls.len());

    for (i, url) in urls.iter().enumerate() {
        log::info!("[{}/{}] Checking: {}", i + 1, urls.len(), url);

        match scanner.scan(url).await {
            Ok(scan) => {
                summary.pages += scan.pages;
                summary.candidates += scan.candidates.len();
                summary.block_failures += scan.failures.len();

                for candidate in &scan.candidates {
                    let class = classifier.classify(&candidate.title, &candidate.href);
                    let Some(line) =
                        ReportLine::candidate(candidate, class, &config.export.untitled)
                    else {
                        continue;
                    };
                    log::info!("  {class} match: {}", candidate.title);

                    let id = candidate.identity();
                    let is_new = tracker.is_new(&id);
                    if is_new {
                        log::info!("  NEW: {class} - {}", candidate.title);
                        tracker.record(id, epoch_seconds(Utc::now()));
                    }
                    summary.matches += 1;
                    summary.report.add_match(line, is_new);
                }
            }
            Err(e) => {
                log::warn!("Source failed: {url}: {e}");
                summary.failed_sources += 1;
                summary.report.add_warning(ReportLine::warning(url, &e));
            }
        }

        if !source_delay.is_zero() {
            tokio::time::sleep(source_delay).await;
        }
    }

    summary.new_matches = summary.report.new_matches();

    // State first: exports and notification may still fail after this.
    log::info!("Recorded {} new identities", tracker.recorded());
    summary.state_saved = tracker.persist(storage).await;

    summary.report.rank();
    let now = Local::now();
    let exports = [
        (&config.paths.all_results, reporter.render_all(&summary.report, now)),
        (&config.paths.new_results, reporter.render_new(&summary.report, now)),
    ];
    for (name, text) in exports {
        match storage.write_export(name, &text).await {
            Ok(()) => summary.exports_written += 1,
            Err(e) => log::error!("Failed to write {name}: {e}"),
        }
    }

    match reporter.notification_body(&summary.report.new) {
        Some(body) => match notifier {
            Some(notifier) => {
                log::info!("Sending notification...");
                summary.notification = Some(notifier.notify(&body).await);
            }
            None => log::info!("Notifications disabled; {} new matches", summary.new_matches),
        },
        None => log::info!("Scan completed. No new KJPP positions found."),
    }

    log::info!(
        "Run complete: {} sources ({} failed), {} matches, {} new",
        summary.sources,
        summary.failed_sources,
        summary.matches,
        summary.new_matches
    );

    Ok(summary)
}
