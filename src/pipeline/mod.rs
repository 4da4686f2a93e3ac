//! Pipeline entry points for monitor runs.
//!
//! - `run_monitor`: scan every source, classify, track novelty, export, notify

pub mod novelty;
pub mod report;
pub mod run;

pub use novelty::NoveltyTracker;
pub use report::{ReportLine, Reporter, RunReport, WARNING_PRIORITY};
pub use run::{RunSummary, run_monitor};
