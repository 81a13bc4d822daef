use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::CheckSettings;
use crate::errlog::ErrorRecord;

/// Configuration for one homepage check run
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Homepage URL to load
    pub url: String,

    /// Timeout for each landmark checkpoint
    pub landmark_timeout: Duration,

    /// Timeout for each content-section checkpoint
    pub section_timeout: Duration,

    /// Content section texts verified in order
    pub sections: Vec<String>,
}

impl CheckConfig {
    /// Build a check config from resolved settings
    pub fn from_settings(settings: &CheckSettings) -> Self {
        Self {
            url: settings.url.clone(),
            landmark_timeout: Duration::from_secs(settings.landmark_timeout),
            section_timeout: Duration::from_secs(settings.section_timeout),
            sections: settings.sections.clone(),
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self::from_settings(&CheckSettings::defaults())
    }
}

/// One network resource loaded by the page, from the browser's resource
/// timing entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Resource URL with any query string stripped
    pub url: String,
    /// Initiator kind (e.g. "script", "link", "css", "img")
    pub kind: String,
    /// Load duration in milliseconds
    pub duration_ms: u64,
}

/// Summary of a completed check run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// The run's screenshot folder
    pub run_dir: PathBuf,

    /// Screenshot paths in capture order
    pub screenshots: Vec<PathBuf>,

    /// Errors collected during the run, in detection order
    pub errors: Vec<ErrorRecord>,

    /// Path of the persisted error log
    pub errors_path: PathBuf,

    /// Path of the plain-text load report
    pub log_path: PathBuf,

    /// Number of logged steps
    pub steps: usize,
}

/// Result type for check operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Error types for check operations
#[derive(Debug)]
pub enum CheckError {
    /// Browser/driver failure (launch, navigation, wait timeout, evaluation)
    Driver(String),

    /// I/O error while writing artifacts
    Io(std::io::Error),
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckError::Driver(msg) => write!(f, "Driver error: {}", msg),
            CheckError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::Driver(_) => None,
            CheckError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CheckError {
    fn from(err: std::io::Error) -> Self {
        CheckError::Io(err)
    }
}
