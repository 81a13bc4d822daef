//! Headless Chrome page driver.
//!
//! Drives a real browser over the Chrome DevTools Protocol. Page runtime
//! errors are trapped by a script installed right after navigation and
//! drained on demand; waits block up to their timeout and surface as driver
//! errors the check records as failed checkpoints.

use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use super::types::{CheckError, CheckResult, ResourceEntry};
use super::PageDriver;
use crate::errlog::ErrorRecord;

/// Poll interval for text waits
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Script installing the page-error trap (idempotent per document)
const ERROR_TRAP: &str = r#"
(() => {
  if (!window.__pageErrors) {
    window.__pageErrors = [];
    window.addEventListener('error', (e) => {
      window.__pageErrors.push({
        message: String(e.message || e),
        stack: e.error && e.error.stack ? String(e.error.stack) : ''
      });
    });
  }
})()
"#;

/// Page driver backed by a headless Chrome instance
pub struct ChromeDriver {
    // Keep the browser alive for the lifetime of the tab
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    /// Launch a headless browser with the given window size
    pub fn launch(width: u32, height: u32) -> CheckResult<Self> {
        let options = LaunchOptionsBuilder::default()
            .headless(true)
            .window_size(Some((width, height)))
            .idle_browser_timeout(Duration::from_secs(300))
            .build()
            .map_err(driver_err)?;
        let browser = Browser::new(options).map_err(driver_err)?;
        let tab = browser.new_tab().map_err(driver_err)?;
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    /// Evaluate an expression and return its JSON value, if any
    fn eval(&self, expression: &str) -> CheckResult<Option<serde_json::Value>> {
        let remote = self.tab.evaluate(expression, false).map_err(driver_err)?;
        Ok(remote.value)
    }

    /// Evaluate an expression producing a JSON-stringified result and parse it
    fn eval_json<T: serde::de::DeserializeOwned>(&self, expression: &str) -> CheckResult<T> {
        match self.eval(expression)? {
            Some(serde_json::Value::String(json)) => serde_json::from_str(&json)
                .map_err(|e| CheckError::Driver(format!("unexpected evaluation result: {}", e))),
            other => Err(CheckError::Driver(format!(
                "unexpected evaluation result: {:?}",
                other
            ))),
        }
    }
}

fn driver_err(err: impl std::fmt::Display) -> CheckError {
    CheckError::Driver(err.to_string())
}

impl PageDriver for ChromeDriver {
    fn goto(&mut self, url: &str) -> CheckResult<()> {
        self.tab.navigate_to(url).map_err(driver_err)?;
        self.tab.wait_until_navigated().map_err(driver_err)?;
        // Errors thrown during the initial parse are missed; acceptable for
        // a diagnostic artifact
        self.eval(ERROR_TRAP)?;
        Ok(())
    }

    fn wait_visible(&mut self, selector: &str, timeout: Duration) -> CheckResult<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|e| {
                CheckError::Driver(format!(
                    "element '{}' not visible within {:?}: {}",
                    selector, timeout, e
                ))
            })
    }

    fn wait_text(&mut self, text: &str, timeout: Duration) -> CheckResult<()> {
        let needle = serde_json::to_string(text).unwrap_or_else(|_| format!("{:?}", text));
        let probe = format!("document.body && document.body.innerText.includes({needle})");
        let deadline = Instant::now() + timeout;
        loop {
            if matches!(self.eval(&probe)?, Some(serde_json::Value::Bool(true))) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CheckError::Driver(format!(
                    "text \"{}\" not found within {:?}",
                    text, timeout
                )));
            }
            sleep(POLL_INTERVAL);
        }
    }

    fn exists(&mut self, selector: &str) -> bool {
        self.tab.find_element(selector).is_ok()
    }

    fn click(&mut self, selector: &str) -> CheckResult<()> {
        let element = self.tab.find_element(selector).map_err(driver_err)?;
        element.click().map(|_| ()).map_err(driver_err)
    }

    fn screenshot(&mut self) -> CheckResult<Vec<u8>> {
        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(driver_err)
    }

    fn image_stats(&mut self) -> CheckResult<(usize, usize)> {
        #[derive(serde::Deserialize)]
        struct Stats {
            loaded: usize,
            total: usize,
        }
        let stats: Stats = self.eval_json(
            r#"JSON.stringify((() => {
                const imgs = Array.from(document.images);
                return {
                  total: imgs.length,
                  loaded: imgs.filter(i => i.complete && i.naturalWidth > 0).length
                };
            })())"#,
        )?;
        Ok((stats.loaded, stats.total))
    }

    fn resource_entries(&mut self) -> CheckResult<Vec<ResourceEntry>> {
        self.eval_json(
            r#"JSON.stringify(performance.getEntriesByType('resource')
                .filter(e => /^(script|link|css|img|navigation|fetch|xmlhttprequest)$/.test(e.initiatorType))
                .map(e => ({
                  url: e.name.split('?')[0],
                  kind: e.initiatorType,
                  duration_ms: Math.round(e.duration)
                })))"#,
        )
    }

    fn load_timings(&mut self) -> Option<(u64, u64)> {
        #[derive(serde::Deserialize)]
        struct Timings {
            dom: u64,
            full: u64,
        }
        let timings: Option<Timings> = self
            .eval_json(
                r#"JSON.stringify((() => {
                    const t = performance.timing;
                    if (!t || !t.loadEventEnd || t.loadEventEnd < t.navigationStart) return null;
                    return {
                      dom: t.domContentLoadedEventEnd - t.navigationStart,
                      full: t.loadEventEnd - t.navigationStart
                    };
                })())"#,
            )
            .ok()
            .flatten();
        timings.map(|t| (t.dom, t.full))
    }

    fn drain_page_errors(&mut self) -> Vec<ErrorRecord> {
        // Best effort: a failed drain yields no records, never an error
        self.eval_json::<Vec<ErrorRecord>>(
            "JSON.stringify(window.__pageErrors ? window.__pageErrors.splice(0) : [])",
        )
        .unwrap_or_default()
    }
}
