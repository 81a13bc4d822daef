//! The homepage check: a linear sequence of logged, screenshotted checkpoints
//! driven through a [`PageDriver`].
//!
//! Checkpoint failures (timeouts, missing elements) and page runtime errors
//! are recorded into the run's error collector and never abort the remaining
//! checkpoints; only artifact I/O failures propagate. The run always leaves a
//! text load report and an `errors.json` behind, even on a clean pass.

pub mod chrome;
pub mod mock;
pub mod types;

pub use chrome::ChromeDriver;
pub use mock::MockPage;
pub use types::{CheckConfig, CheckError, CheckResult, ResourceEntry, RunSummary};

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ArtifactSettings;
use crate::errlog::{self, ErrorCollector, ErrorRecord};
use crate::session::{RunDir, sanitize_label};
use crate::steplog::StepLog;

/// Landmark checkpoints: (label, CSS selector alternatives)
pub const LANDMARKS: [(&str, &str); 4] = [
    ("header", "header"),
    ("navigation", "nav, [role=\"navigation\"]"),
    ("main-content", "main, [role=\"main\"], #main-content"),
    ("footer", "footer"),
];

/// Primary consent-banner selector
pub const CONSENT_NOTICE: &str = "#didomi-notice";

/// Primary consent-accept button selector
pub const CONSENT_AGREE: &str = "#didomi-notice-agree-button";

/// Fallback consent-banner selectors
pub const CONSENT_ALT_NOTICE: [&str; 2] = ["[aria-label*=\"consent\"]", "[data-testid*=\"didomi\"]"];

/// Fallback consent-accept selector
pub const CONSENT_ALT_AGREE: &str = "[aria-label*=\"accept\"], [data-testid*=\"accept\"]";

/// Browser collaborator interface consumed by the check.
///
/// Calls look synchronous and may block up to the given timeout; a timeout or
/// missing element comes back as [`CheckError::Driver`] and is treated as a
/// failed checkpoint, not a failed run.
pub trait PageDriver {
    /// Navigate to a URL and wait for the navigation to settle
    fn goto(&mut self, url: &str) -> CheckResult<()>;

    /// Wait until an element matching the selector is present
    fn wait_visible(&mut self, selector: &str, timeout: Duration) -> CheckResult<()>;

    /// Wait until the page body contains the given text
    fn wait_text(&mut self, text: &str, timeout: Duration) -> CheckResult<()>;

    /// Probe whether an element matching the selector currently exists
    fn exists(&mut self, selector: &str) -> bool;

    /// Click the first element matching the selector
    fn click(&mut self, selector: &str) -> CheckResult<()>;

    /// Capture a PNG viewport screenshot
    fn screenshot(&mut self) -> CheckResult<Vec<u8>>;

    /// Count (loaded, total) images on the page
    fn image_stats(&mut self) -> CheckResult<(usize, usize)>;

    /// Read the page's resource timing entries for document, style, script
    /// and image loads
    fn resource_entries(&mut self) -> CheckResult<Vec<ResourceEntry>>;

    /// Navigation timings as (dom_content_loaded_ms, full_load_ms), if known
    fn load_timings(&mut self) -> Option<(u64, u64)>;

    /// Drain page runtime errors detected since the last call
    fn drain_page_errors(&mut self) -> Vec<ErrorRecord>;
}

/// Run the full homepage check, writing artifacts under `artifacts`.
///
/// Returns a hard error only for artifact I/O failures or a driver failure
/// outside any checkpoint; everything else is recorded and the run continues.
pub fn run_check(
    driver: &mut dyn PageDriver,
    config: &CheckConfig,
    artifacts: &ArtifactSettings,
) -> CheckResult<RunSummary> {
    let mut log = StepLog::start();
    let mut collector = ErrorCollector::new();
    let run = RunDir::create(&artifacts.screenshots_root(), "homepage")?;
    let mut screenshots: Vec<PathBuf> = Vec::new();

    log.step(format!("START - visiting {}", config.url));
    shot(driver, &run, &mut log, &mut collector, &mut screenshots, "before-visit")?;

    if checkpoint(driver.goto(&config.url), &mut log, &mut collector, "homepage navigation") {
        log.step("document accessible");
    }
    shot(driver, &run, &mut log, &mut collector, &mut screenshots, "after-visit")?;

    let early_errors = driver.drain_page_errors();
    if early_errors.is_empty() {
        log.step("no page errors detected");
    } else {
        log.step(format!("{} page error(s) detected", early_errors.len()));
        for error in early_errors {
            collector.push(error);
        }
    }
    shot(driver, &run, &mut log, &mut collector, &mut screenshots, "error-check")?;

    accept_consent_banner(driver, &run, &mut log, &mut collector, &mut screenshots)?;
    shot(driver, &run, &mut log, &mut collector, &mut screenshots, "after-consent")?;

    log.step("verifying main landmarks");
    for (name, selector) in LANDMARKS {
        let ok = checkpoint(
            driver.wait_visible(selector, config.landmark_timeout),
            &mut log,
            &mut collector,
            &format!("landmark '{name}'"),
        );
        if ok {
            log.step(format!("{name} loaded"));
            shot(
                driver,
                &run,
                &mut log,
                &mut collector,
                &mut screenshots,
                &format!("{name}-loaded"),
            )?;
        }
    }

    if !config.sections.is_empty() {
        log.step("verifying content sections");
    }
    for (index, section) in config.sections.iter().enumerate() {
        let ok = checkpoint(
            driver.wait_text(section, config.section_timeout),
            &mut log,
            &mut collector,
            &format!("section \"{section}\""),
        );
        if ok {
            log.step(format!("section \"{section}\" loaded"));
            let label = format!("section-{index}-{}", sanitize_label(section).to_lowercase());
            shot(driver, &run, &mut log, &mut collector, &mut screenshots, &label)?;
        }
    }

    match driver.image_stats() {
        Ok((loaded, total)) => {
            log.step(format!("found {total} images in total"));
            log.step(format!("{loaded} of {total} images already loaded"));
        }
        Err(err) => collector.record("image stats unavailable", err.to_string()),
    }

    match driver.resource_entries() {
        Ok(entries) => {
            log.step(format!("{} resource(s) loaded", entries.len()));
            for entry in entries {
                log.step(format!(
                    "resource loaded: {} ({}, {}ms)",
                    entry.url, entry.kind, entry.duration_ms
                ));
            }
        }
        Err(err) => collector.record("resource readout unavailable", err.to_string()),
    }

    shot(driver, &run, &mut log, &mut collector, &mut screenshots, "page-complete")?;

    if let Some((dom_ms, full_ms)) = driver.load_timings() {
        log.step(format!("DOM load time: {dom_ms}ms"));
        log.step(format!("full load time: {full_ms}ms"));
    }

    for error in driver.drain_page_errors() {
        collector.push(error);
    }

    log.step(format!(
        "CHECK COMPLETE - {} screenshot(s), {} error(s)",
        screenshots.len(),
        collector.len()
    ));

    let errors_path = artifacts.errors_path();
    errlog::flush(&errors_path, collector.records())?;
    let log_path = log.save(&artifacts.reports_dir())?;

    Ok(RunSummary {
        run_dir: run.dir,
        screenshots,
        errors: collector.records().to_vec(),
        errors_path,
        log_path,
        steps: log.entries().len(),
    })
}

/// Locate and accept the cookie-consent banner, trying the primary selector
/// first and the alternative heuristics second
fn accept_consent_banner(
    driver: &mut dyn PageDriver,
    run: &RunDir,
    log: &mut StepLog,
    collector: &mut ErrorCollector,
    screenshots: &mut Vec<PathBuf>,
) -> CheckResult<()> {
    log.step("looking for consent banner");

    if driver.exists(CONSENT_NOTICE) {
        log.step("consent banner found");
        shot(driver, run, log, collector, screenshots, "consent-banner")?;
        if checkpoint(driver.click(CONSENT_AGREE), log, collector, "consent accept button") {
            log.step("consent banner accepted");
        }
    } else if CONSENT_ALT_NOTICE.iter().any(|s| driver.exists(s)) {
        log.step("alternative consent banner found");
        shot(driver, run, log, collector, screenshots, "consent-alternative")?;
        if checkpoint(
            driver.click(CONSENT_ALT_AGREE),
            log,
            collector,
            "alternative consent accept button",
        ) {
            log.step("alternative consent banner accepted");
        }
    } else {
        log.step("no consent banner found - possibly already accepted");
    }
    Ok(())
}

/// Record a checkpoint outcome: a driver failure is logged and collected but
/// swallowed so the remaining checkpoints still run. Returns whether the
/// checkpoint passed.
fn checkpoint(
    result: CheckResult<()>,
    log: &mut StepLog,
    collector: &mut ErrorCollector,
    what: &str,
) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log.step(format!("{what} failed: {err}"));
            collector.record(format!("{what} failed"), err.to_string());
            false
        }
    }
}

/// Capture a labelled viewport screenshot into the run folder.
///
/// A driver capture failure is recorded and swallowed; a filesystem write
/// failure propagates.
fn shot(
    driver: &mut dyn PageDriver,
    run: &RunDir,
    log: &mut StepLog,
    collector: &mut ErrorCollector,
    screenshots: &mut Vec<PathBuf>,
    label: &str,
) -> CheckResult<()> {
    match driver.screenshot() {
        Ok(png) => {
            let path = run.save_capture(label, &log.elapsed(), &png)?;
            screenshots.push(path);
        }
        Err(err) => {
            collector.record(format!("screenshot '{label}' failed"), err.to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errlog;

    fn artifacts() -> (tempfile::TempDir, ArtifactSettings) {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = ArtifactSettings::in_root(dir.path());
        (dir, settings)
    }

    fn fast_config(sections: &[&str]) -> CheckConfig {
        CheckConfig {
            url: "https://example.test".to_string(),
            landmark_timeout: Duration::from_millis(10),
            section_timeout: Duration::from_millis(10),
            sections: sections.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_clean_run_writes_empty_error_log() {
        let (_guard, settings) = artifacts();
        let mut driver = MockPage::new()
            .with_selector(CONSENT_NOTICE)
            .with_selector(CONSENT_AGREE)
            .with_selectors(["header", "nav", "main", "footer"])
            .with_text("Savings");

        let summary =
            run_check(&mut driver, &fast_config(&["Savings"]), &settings).expect("run");

        assert!(summary.errors.is_empty());
        assert!(summary.errors_path.exists());
        assert_eq!(errlog::load(&summary.errors_path), vec![]);
        assert!(summary.log_path.exists());
        assert!(!summary.screenshots.is_empty());
        for path in &summary.screenshots {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_missing_landmark_is_recorded_not_fatal() {
        let (_guard, settings) = artifacts();
        // No footer, no sections present
        let mut driver = MockPage::new().with_selectors(["header", "nav", "main"]);

        let summary =
            run_check(&mut driver, &fast_config(&["Missing section"]), &settings).expect("run");

        // footer landmark + section both failed, run still completed
        assert_eq!(summary.errors.len(), 2);
        assert!(summary.errors[0].message.contains("footer"));
        assert!(summary.errors[1].message.contains("Missing section"));
        assert!(summary.log_path.exists());
    }

    #[test]
    fn test_page_errors_are_collected() {
        let (_guard, settings) = artifacts();
        let mut driver = MockPage::new()
            .with_selectors(["header", "nav", "main", "footer"])
            .with_page_error("ReferenceError: x is not defined", "at app.js:3");

        let summary = run_check(&mut driver, &fast_config(&[]), &settings).expect("run");

        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].message, "ReferenceError: x is not defined");
        let persisted = errlog::load(&summary.errors_path);
        assert_eq!(persisted, summary.errors);
    }

    #[test]
    fn test_resource_loads_are_logged() {
        let (_guard, settings) = artifacts();
        let mut driver = MockPage::new()
            .with_selectors(["header", "nav", "main", "footer"])
            .with_resource("https://cdn.example.test/app.js", "script", 143)
            .with_resource("https://cdn.example.test/site.css", "link", 57);

        let summary = run_check(&mut driver, &fast_config(&[]), &settings).expect("run");

        let log_body = std::fs::read_to_string(&summary.log_path).expect("read log");
        assert!(log_body.contains("2 resource(s) loaded"));
        assert!(log_body.contains("resource loaded: https://cdn.example.test/app.js (script, 143ms)"));
        assert!(log_body.contains("resource loaded: https://cdn.example.test/site.css (link, 57ms)"));
    }

    #[test]
    fn test_failed_navigation_keeps_going() {
        let (_guard, settings) = artifacts();
        let mut driver = MockPage::new().failing_navigation();

        let summary = run_check(&mut driver, &fast_config(&[]), &settings).expect("run");

        assert!(summary
            .errors
            .iter()
            .any(|e| e.message.contains("homepage navigation")));
        // Artifacts still written
        assert!(summary.errors_path.exists());
        assert!(summary.log_path.exists());
    }
}
