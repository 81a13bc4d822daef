//! Run-folder management for screenshot artifacts.
//!
//! Each check run gets its own timestamped folder under the screenshots root.
//! Screenshot labels are sanitized to filesystem-safe characters, and the
//! run's elapsed token is embedded in the file name so the report generator
//! can order captures chronologically.

use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A per-run screenshot folder
#[derive(Debug, Clone)]
pub struct RunDir {
    /// Folder name, e.g. `homepage_20260823_141503_512`
    pub id: String,
    /// Full path of the run folder
    pub dir: PathBuf,
}

impl RunDir {
    /// Create a fresh timestamped run folder under `screenshots_root`.
    ///
    /// Folder names carry millisecond precision; if a folder with the same
    /// name already exists the name gets a numeric suffix, so two runs can
    /// never interleave their captures.
    pub fn create(screenshots_root: &Path, name: &str) -> io::Result<Self> {
        fs::create_dir_all(screenshots_root)?;
        let base = format!("{}_{}", sanitize_label(name), timestamp_suffix());
        let mut id = base.clone();
        let mut attempt = 1;
        loop {
            let dir = screenshots_root.join(&id);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok(Self { id, dir }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    attempt += 1;
                    id = format!("{base}-{attempt}");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Path for a capture with the elapsed token embedded in the stem
    pub fn capture_path(&self, label: &str, elapsed: &str) -> PathBuf {
        self.dir
            .join(format!("{}-{}.png", sanitize_label(label), elapsed))
    }

    /// Write PNG bytes for a labelled capture, returning the written path
    pub fn save_capture(&self, label: &str, elapsed: &str, png: &[u8]) -> io::Result<PathBuf> {
        let path = self.capture_path(label, elapsed);
        fs::write(&path, png)?;
        Ok(path)
    }
}

/// Generate a millisecond-precision timestamp suffix for run-folder names
fn timestamp_suffix() -> String {
    Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string()
}

/// Sanitize a label for use in file names.
///
/// Dots are preserved so elapsed tokens like `3.42s` survive intact.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '-',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("header-loaded"), "header-loaded");
        assert_eq!(sanitize_label("Comptes bancaires"), "Comptes-bancaires");
        assert_eq!(sanitize_label("a/b\\c"), "a-b-c");
        assert_eq!(sanitize_label("3.42s"), "3.42s");
    }

    #[test]
    fn test_create_and_capture_path() {
        let root = tempfile::tempdir().expect("tempdir");
        let run = RunDir::create(root.path(), "homepage").expect("create");

        assert!(run.dir.exists());
        assert!(run.id.starts_with("homepage_"));

        let path = run.capture_path("after visit", "0.50s");
        assert!(path.ends_with("after-visit-0.50s.png"));
    }

    #[test]
    fn test_back_to_back_runs_get_distinct_folders() {
        let root = tempfile::tempdir().expect("tempdir");
        let a = RunDir::create(root.path(), "homepage").expect("first");
        let b = RunDir::create(root.path(), "homepage").expect("second");
        let c = RunDir::create(root.path(), "homepage").expect("third");

        assert_ne!(a.dir, b.dir);
        assert_ne!(b.dir, c.dir);
        assert!(a.dir.exists() && b.dir.exists() && c.dir.exists());
    }

    #[test]
    fn test_save_capture_writes_png() {
        let root = tempfile::tempdir().expect("tempdir");
        let run = RunDir::create(root.path(), "homepage").expect("create");

        let path = run.save_capture("before-visit", "0.01s", b"png-a").expect("save");
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
    }
}
