//! page-vision - Headless homepage checking with visual load reports.
//!
//! This crate provides:
//! - A linear browser check: navigate, accept the consent banner, verify
//!   landmarks and content sections, screenshot every checkpoint
//! - Step-timed logging with a plain-text load report per run
//! - Run-scoped error collection persisted as JSON
//! - A post-run visual report generator rendering the most recent run's
//!   screenshots into a static HTML timeline
//!
//! # Example
//!
//! ```rust,no_run
//! use page_vision::check::{run_check, CheckConfig, MockPage};
//! use page_vision::config::ArtifactSettings;
//! use page_vision::report::generate_visual_report;
//!
//! let artifacts = ArtifactSettings::in_root("./artifacts");
//! let mut driver = MockPage::new().with_selectors(["header", "nav", "main", "footer"]);
//! let summary = run_check(&mut driver, &CheckConfig::default(), &artifacts).unwrap();
//! println!("captured {} screenshots", summary.screenshots.len());
//! let outcome = generate_visual_report(&artifacts).unwrap();
//! println!("{:?}", outcome);
//! ```

pub mod check;
pub mod config;
pub mod errlog;
pub mod report;
pub mod session;
pub mod steplog;

// Re-export check types
pub use check::{
    CheckConfig, CheckError, CheckResult, ChromeDriver, MockPage, PageDriver, ResourceEntry,
    RunSummary, run_check,
};

// Re-export error collection
pub use errlog::{ErrorCollector, ErrorRecord};

// Re-export report generation
pub use report::{ReportError, ReportOutcome, ReportResult, generate_visual_report};

// Re-export run artifacts and logging
pub use session::RunDir;
pub use steplog::{LogEntry, StepLog, Stopwatch};
