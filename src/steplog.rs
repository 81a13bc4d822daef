//! Step-timed logging for a single check run.
//!
//! A [`Stopwatch`] measures wall-clock time from the start of the run and
//! formats it as a seconds string with two decimals (`"3.42s"`). A [`StepLog`]
//! records `[elapsed] message` lines in emission order, echoes them to the
//! console, and can save the run's plain-text load report.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Measures elapsed time from a reference instant
#[derive(Debug, Clone)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    /// Capture the reference instant
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Elapsed seconds since start, formatted as `<seconds-with-2-decimals>s`
    pub fn elapsed(&self) -> String {
        format!("{:.2}s", self.started.elapsed().as_secs_f64())
    }
}

/// One logged step line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Elapsed time at emission, e.g. "3.42s"
    pub elapsed: String,
    /// Step message
    pub message: String,
}

impl LogEntry {
    /// Render the entry as a `[elapsed] message` line
    pub fn render(&self) -> String {
        format!("[{}] {}", self.elapsed, self.message)
    }
}

/// Ordered step log for one check run
#[derive(Debug)]
pub struct StepLog {
    stopwatch: Stopwatch,
    entries: Vec<LogEntry>,
}

impl StepLog {
    /// Start a new log with a fresh stopwatch
    pub fn start() -> Self {
        Self {
            stopwatch: Stopwatch::start(),
            entries: Vec::new(),
        }
    }

    /// Current elapsed time string
    pub fn elapsed(&self) -> String {
        self.stopwatch.elapsed()
    }

    /// Record a step and echo it to the console
    pub fn step(&mut self, message: impl Into<String>) {
        let entry = LogEntry {
            elapsed: self.stopwatch.elapsed(),
            message: message.into(),
        };
        println!("{}", entry.render());
        self.entries.push(entry);
    }

    /// All recorded entries, in emission order
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Render all entries, one `[elapsed] message` line each
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.render());
            out.push('\n');
        }
        out
    }

    /// Save the rendered log to `load-report-<timestamp>.txt` in `reports_dir`.
    ///
    /// The timestamp is ISO 8601 with colons replaced by dashes so the name
    /// stays filesystem-safe. Returns the written path.
    pub fn save(&self, reports_dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(reports_dir)?;
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ");
        let path = reports_dir.join(format!("load-report-{timestamp}.txt"));
        fs::write(&path, self.render())?;
        Ok(path)
    }
}
