// src/pipeline/report.rs

//! Ranked report lines, export text and notification body.

use chrono::{DateTime, Local};

use crate::error::AppError;
use crate::models::{Candidate, Classification, ExportConfig};

/// Priority of the per-source failure lines.
pub const WARNING_PRIORITY: u8 = 2;

const WARNING_LABEL: &str = "WARN";

/// One ranked entry of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    /// 0 physician role, 1 related role, 2 source failure
    pub priority: u8,
    pub label: String,
    pub title: String,
    pub href: String,
}

impl ReportLine {
    /// Line for a classified candidate; `None` for labels never reported.
    pub fn candidate(
        candidate: &Candidate,
        classification: Classification,
        untitled: &str,
    ) -> Option<Self> {
        let priority = classification.priority()?;
        let title = if candidate.title.is_empty() {
            untitled.to_string()
        } else {
            candidate.title.clone()
        };
        Some(Self {
            priority,
            label: classification.as_str().to_string(),
            title,
            href: candidate.href.clone(),
        })
    }

    /// Synthetic line for a source that failed as a whole.
    pub fn warning(source_url: &str, error: &AppError) -> Self {
        Self {
            priority: WARNING_PRIORITY,
            label: WARNING_LABEL.to_string(),
            title: error.to_string(),
            href: source_url.to_string(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.priority == WARNING_PRIORITY
    }

    /// Two-line block: bulleted label and title, indented URL.
    pub fn render(&self) -> String {
        format!("• [{}] {}\n  {}", self.label, self.title, self.href)
    }
}

/// Lines collected over one run, in discovery order until ranked.
#[derive(Debug, Default)]
pub struct RunReport {
    pub all: Vec<ReportLine>,
    pub new: Vec<ReportLine>,
}

impl RunReport {
    pub fn add_match(&mut self, line: ReportLine, is_new: bool) {
        if is_new {
            self.new.push(line.clone());
        }
        self.all.push(line);
    }

    /// Failures go to both lists so they are visible in either export.
    pub fn add_warning(&mut self, line: ReportLine) {
        self.new.push(line.clone());
        self.all.push(line);
    }

    /// Sort both lists by priority; order within a tier is kept.
    pub fn rank(&mut self) {
        self.all.sort_by_key(|line| line.priority);
        self.new.sort_by_key(|line| line.priority);
    }

    pub fn new_matches(&self) -> usize {
        self.new.iter().filter(|l| !l.is_warning()).count()
    }
}

/// Formats exports and the notification body.
pub struct Reporter {
    export: ExportConfig,
    include_related: bool,
}

impl Reporter {
    pub fn new(export: ExportConfig, include_related: bool) -> Self {
        Self {
            export,
            include_related,
        }
    }

    /// Export file text: header with timestamp, then one block per line.
    pub fn render_export(&self, header: &str, lines: &[ReportLine], at: DateTime<Local>) -> String {
        let mut body = format!("{} ({})\n\n", header, at.format("%Y-%m-%d %H:%M:%S"));
        if lines.is_empty() {
            body.push_str(&self.export.empty_placeholder);
        } else {
            let blocks: Vec<String> = lines.iter().map(ReportLine::render).collect();
            body.push_str(&blocks.join("\n"));
        }
        body.push('\n');
        body
    }

    pub fn render_all(&self, report: &RunReport, at: DateTime<Local>) -> String {
        self.render_export(&self.export.all_header, &report.all, at)
    }

    pub fn render_new(&self, report: &RunReport, at: DateTime<Local>) -> String {
        self.render_export(&self.export.new_header, &report.new, at)
    }

    /// Message for the new matches, physician roles first.
    ///
    /// `None` when nothing would be listed, so warnings alone never notify.
    pub fn notification_body(&self, new_lines: &[ReportLine]) -> Option<String> {
        let physician: Vec<String> = new_lines
            .iter()
            .filter(|l| l.priority == 0)
            .map(ReportLine::render)
            .collect();
        let related: Vec<String> = if self.include_related {
            new_lines
                .iter()
                .filter(|l| l.priority == 1)
                .map(ReportLine::render)
                .collect()
        } else {
            Vec::new()
        };

        if physician.is_empty() && related.is_empty() {
            return None;
        }

        let mut sections = vec![self.export.message_title.clone()];
        if !physician.is_empty() {
            sections.push(format!("{}\n{}", self.export.physician_section, physician.join("\n")));
        }
        if !related.is_empty() {
            sections.push(format!("{}\n{}", self.export.related_section, related.join("\n")));
        }
        Some(sections.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use url::Url;

    use super::*;

    fn candidate(href: &str, title: &str) -> Candidate {
        Candidate::new(&Url::parse(href).unwrap(), title, "links").unwrap()
    }

    fn line(priority: u8, title: &str) -> ReportLine {
        let class = match priority {
            0 => Classification::PhysicianRole,
            _ => Classification::RelatedRole,
        };
        ReportLine::candidate(&candidate("https://x.test/jobs/1", title), class, "(ohne Titel)")
            .unwrap()
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_render_line() {
        let l = line(0, "Assistenzarzt (m/w/d) KJPP");
        assert_eq!(
            l.render(),
            "• [PHYSICIAN_ROLE] Assistenzarzt (m/w/d) KJPP\n  https://x.test/jobs/1"
        );
    }

    #[test]
    fn test_untitled_placeholder() {
        let c = candidate("https://x.test/jobs/2", "");
        let l = ReportLine::candidate(&c, Classification::RelatedRole, "(ohne Titel)").unwrap();
        assert_eq!(l.title, "(ohne Titel)");
        assert!(ReportLine::candidate(&c, Classification::Excluded, "-").is_none());
    }

    #[test]
    fn test_rank_is_stable_within_tier() {
        let mut report = RunReport::default();
        let err = AppError::fetch("https://down.test", "timeout");
        report.add_warning(ReportLine::warning("https://down.test", &err));
        report.add_match(line(1, "Psychologe Kinder A"), true);
        report.add_match(line(0, "Facharzt KJPP B"), false);
        report.add_match(line(1, "Psychologe Kinder C"), true);
        report.add_match(line(0, "Facharzt KJPP D"), true);
        report.rank();

        let titles: Vec<&str> = report.all.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(
            &titles[..4],
            ["Facharzt KJPP B", "Facharzt KJPP D", "Psychologe Kinder A", "Psychologe Kinder C"]
        );
        assert!(report.all[4].is_warning());
        assert_eq!(report.new.len(), 4);
        assert_eq!(report.new_matches(), 3);
        assert_eq!(report.new[0].title, "Facharzt KJPP D");
    }

    #[test]
    fn test_export_text() {
        let reporter = Reporter::new(ExportConfig::default(), true);
        let text = reporter.render_export("Neue Treffer:", &[line(0, "Facharzt KJPP")], at());
        assert_eq!(
            text,
            "Neue Treffer: (2026-03-01 08:30:00)\n\n• [PHYSICIAN_ROLE] Facharzt KJPP\n  https://x.test/jobs/1\n"
        );
    }

    #[test]
    fn test_empty_export_has_placeholder() {
        let reporter = Reporter::new(ExportConfig::default(), true);
        let text = reporter.render_export("Alle Treffer:", &[], at());
        assert_eq!(text, "Alle Treffer: (2026-03-01 08:30:00)\n\n(keine Treffer)\n");
    }

    #[test]
    fn test_notification_sections() {
        let reporter = Reporter::new(ExportConfig::default(), true);
        let body = reporter
            .notification_body(&[line(0, "Oberarzt KJPP"), line(1, "Psychologe Jugend")])
            .unwrap();
        let physician = body.find("KJPP-Arztstellen").unwrap();
        let related = body.find("Verwandte Positionen").unwrap();
        assert!(body.starts_with("🆕 Neue KJPP-Stellen"));
        assert!(physician < body.find("Oberarzt KJPP").unwrap());
        assert!(physician < related);
        assert!(related < body.find("Psychologe Jugend").unwrap());
    }

    #[test]
    fn test_related_toggle_only_affects_notification() {
        let reporter = Reporter::new(ExportConfig::default(), false);
        let lines = [line(1, "Psychologe Jugend")];
        assert!(reporter.notification_body(&lines).is_none());
        assert!(reporter.render_export("h", &lines, at()).contains("Psychologe Jugend"));
    }

    #[test]
    fn test_warnings_alone_do_not_notify() {
        let reporter = Reporter::new(ExportConfig::default(), true);
        let err = AppError::EmptyBody {
            url: "https://x.test".to_string(),
            bytes: 0,
        };
        assert!(
            reporter
                .notification_body(&[ReportLine::warning("https://x.test", &err)])
                .is_none()
        );
    }
}
