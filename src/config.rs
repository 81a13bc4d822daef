//! Configuration management with environment variable support.
//!
//! This module provides centralized configuration for page-vision, supporting:
//! - Environment variables for all configurable values
//! - Sensible defaults matching the original check against www.bnc.ca
//! - Derived artifact paths (screenshots root, reports directory)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `PAGE_VISION_ARTIFACT_DIR` | Root directory for run artifacts | `./artifacts` |
//! | `PAGE_VISION_URL` | Homepage URL under check | `https://www.bnc.ca` |
//! | `PAGE_VISION_LANDMARK_TIMEOUT` | Landmark checkpoint timeout (seconds) | `15` |
//! | `PAGE_VISION_SECTION_TIMEOUT` | Content-section checkpoint timeout (seconds) | `10` |
//! | `PAGE_VISION_VIEWPORT` | Viewport preset or WxH | `desktop` |
//! | `PAGE_VISION_SECTIONS` | Comma-separated section texts to verify | homepage sections |
//!
//! # Example
//!
//! ```bash
//! export PAGE_VISION_URL="https://staging.example.test"
//! export PAGE_VISION_ARTIFACT_DIR="/var/tmp/page-vision"
//! export PAGE_VISION_VIEWPORT="1440x900"
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default root directory for run artifacts
pub const DEFAULT_ARTIFACT_DIR: &str = "./artifacts";

/// Default homepage URL under check
pub const DEFAULT_URL: &str = "https://www.bnc.ca";

/// Default landmark checkpoint timeout (seconds)
pub const DEFAULT_LANDMARK_TIMEOUT: u64 = 15;

/// Default content-section checkpoint timeout (seconds)
pub const DEFAULT_SECTION_TIMEOUT: u64 = 10;

/// Default viewport preset
pub const DEFAULT_VIEWPORT: &str = "desktop";

/// Default viewport width (pixels)
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

/// Default viewport height (pixels)
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 800;

/// Default content sections verified on the homepage
pub const DEFAULT_SECTIONS: [&str; 4] = [
    "Comptes bancaires",
    "Hypothèque",
    "Cartes de crédit",
    "Épargne",
];

/// Subdirectory of the artifact root holding per-run screenshot folders
pub const SCREENSHOTS_SUBDIR: &str = "screenshots";

/// Subdirectory of the artifact root holding reports and the error log
pub const REPORTS_SUBDIR: &str = "reports";

/// File name of the persisted error log inside the reports directory
pub const ERRORS_FILE: &str = "errors.json";

/// File name of the rendered visual report inside the reports directory
pub const REPORT_FILE: &str = "visual-report.html";

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the artifact root
pub const ENV_ARTIFACT_DIR: &str = "PAGE_VISION_ARTIFACT_DIR";

/// Environment variable for the homepage URL
pub const ENV_URL: &str = "PAGE_VISION_URL";

/// Environment variable for the landmark timeout
pub const ENV_LANDMARK_TIMEOUT: &str = "PAGE_VISION_LANDMARK_TIMEOUT";

/// Environment variable for the section timeout
pub const ENV_SECTION_TIMEOUT: &str = "PAGE_VISION_SECTION_TIMEOUT";

/// Environment variable for the viewport size
pub const ENV_VIEWPORT: &str = "PAGE_VISION_VIEWPORT";

/// Environment variable for the section list
pub const ENV_SECTIONS: &str = "PAGE_VISION_SECTIONS";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for page-vision
#[derive(Debug, Clone)]
pub struct Config {
    /// Artifact layout settings
    pub artifacts: ArtifactSettings,
    /// Browser check settings
    pub check: CheckSettings,
}

/// Artifact layout settings
#[derive(Debug, Clone)]
pub struct ArtifactSettings {
    /// Root directory holding screenshots/ and reports/
    pub root: PathBuf,
}

/// Browser check settings
#[derive(Debug, Clone)]
pub struct CheckSettings {
    /// Homepage URL under check
    pub url: String,
    /// Landmark checkpoint timeout (seconds)
    pub landmark_timeout: u64,
    /// Content-section checkpoint timeout (seconds)
    pub section_timeout: u64,
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
    /// Content section texts verified in order
    pub sections: Vec<String>,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            artifacts: ArtifactSettings::from_env(),
            check: CheckSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            artifacts: ArtifactSettings::defaults(),
            check: CheckSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ArtifactSettings {
    /// Create artifact settings from environment variables
    pub fn from_env() -> Self {
        Self {
            root: env::var(ENV_ARTIFACT_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_ARTIFACT_DIR)),
        }
    }

    /// Create artifact settings with defaults
    pub fn defaults() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ARTIFACT_DIR),
        }
    }

    /// Create artifact settings rooted at a specific directory
    pub fn in_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory for per-run screenshot folders
    pub fn screenshots_root(&self) -> PathBuf {
        self.root.join(SCREENSHOTS_SUBDIR)
    }

    /// Directory for reports and the persisted error log
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join(REPORTS_SUBDIR)
    }

    /// Path of the persisted error log
    pub fn errors_path(&self) -> PathBuf {
        self.reports_dir().join(ERRORS_FILE)
    }

    /// Path of the rendered visual report
    pub fn report_path(&self) -> PathBuf {
        self.reports_dir().join(REPORT_FILE)
    }
}

impl CheckSettings {
    /// Create check settings from environment variables
    pub fn from_env() -> Self {
        let viewport = env::var(ENV_VIEWPORT).unwrap_or_else(|_| DEFAULT_VIEWPORT.to_string());
        let (width, height) = parse_viewport(&viewport)
            .unwrap_or((DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT));

        Self {
            url: env::var(ENV_URL).unwrap_or_else(|_| DEFAULT_URL.to_string()),
            landmark_timeout: env::var(ENV_LANDMARK_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LANDMARK_TIMEOUT),
            section_timeout: env::var(ENV_SECTION_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SECTION_TIMEOUT),
            viewport_width: width,
            viewport_height: height,
            sections: env::var(ENV_SECTIONS)
                .map(|s| parse_sections(&s))
                .unwrap_or_else(|_| default_sections()),
        }
    }

    /// Create check settings with defaults
    pub fn defaults() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            landmark_timeout: DEFAULT_LANDMARK_TIMEOUT,
            section_timeout: DEFAULT_SECTION_TIMEOUT,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            sections: default_sections(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a viewport string into (width, height)
/// Supports: "desktop" (1280x800), "laptop" (1440x900), "mobile" (390x844), or "WxH"
pub fn parse_viewport(size: &str) -> Option<(u32, u32)> {
    match size.to_lowercase().as_str() {
        "desktop" => Some((1280, 800)),
        "laptop" => Some((1440, 900)),
        "mobile" => Some((390, 844)),
        custom => {
            let parts: Vec<&str> = custom.split('x').collect();
            if parts.len() == 2 {
                let w = parts[0].parse().ok()?;
                let h = parts[1].parse().ok()?;
                Some((w, h))
            } else {
                None
            }
        }
    }
}

/// Parse a comma-separated section list, dropping empty entries
pub fn parse_sections(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// The default section list as owned strings
pub fn default_sections() -> Vec<String> {
    DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect()
}
