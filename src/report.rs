//! Visual report generation from on-disk run artifacts.
//!
//! The generator is a post-run batch step with no in-process link to the
//! check itself: it finds the most recently modified run folder under the
//! screenshots root, orders its captures by the elapsed token embedded in
//! their file names, merges the optional persisted error log, and renders a
//! single static HTML timeline. Missing inputs are a no-op outcome, never an
//! error; only a failed write of the one deliverable is surfaced.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::config::ArtifactSettings;
use crate::errlog::{self, ErrorRecord};

/// Result type for report generation
pub type ReportResult<T> = Result<T, ReportError>;

/// Error types for report generation
#[derive(Debug)]
pub enum ReportError {
    /// I/O error while reading artifacts or writing the report
    Io(io::Error),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for ReportError {
    fn from(err: io::Error) -> Self {
        ReportError::Io(err)
    }
}

/// Outcome of a generator invocation
#[derive(Debug)]
pub enum ReportOutcome {
    /// Report rendered and written to this path
    Written(PathBuf),
    /// Nothing to report; no file was written
    NothingToReport(&'static str),
}

/// Generate the visual report for the most recent run.
///
/// Returns [`ReportOutcome::NothingToReport`] when the screenshots root is
/// absent, holds no run folders, or the latest run folder holds no PNG files.
pub fn generate_visual_report(artifacts: &ArtifactSettings) -> ReportResult<ReportOutcome> {
    let screenshots_root = artifacts.screenshots_root();
    if !screenshots_root.is_dir() {
        return Ok(ReportOutcome::NothingToReport("screenshots directory not found"));
    }

    let Some(run_dir) = latest_run_dir(&screenshots_root)? else {
        return Ok(ReportOutcome::NothingToReport("no run folders found"));
    };

    let images = ordered_captures(&run_dir)?;
    if images.is_empty() {
        return Ok(ReportOutcome::NothingToReport(
            "no screenshots found in the most recent run folder",
        ));
    }

    let errors = errlog::load(&artifacts.errors_path());

    let reports_dir = artifacts.reports_dir();
    fs::create_dir_all(&reports_dir)?;
    let report_path = artifacts.report_path();
    let html = render_html(&reports_dir, &images, &errors);
    fs::write(&report_path, html)?;

    Ok(ReportOutcome::Written(report_path))
}

/// Pick the run folder with the maximum modification time.
///
/// Equal mtimes resolve to the lexicographically larger folder name, so the
/// choice stays deterministic.
fn latest_run_dir(screenshots_root: &Path) -> io::Result<Option<PathBuf>> {
    let mut best: Option<(SystemTime, String, PathBuf)> = None;
    for entry in fs::read_dir(screenshots_root)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let mtime = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let name = entry.file_name().to_string_lossy().to_string();
        let replace = match &best {
            Some((t, n, _)) => (&mtime, &name) > (t, n),
            None => true,
        };
        if replace {
            best = Some((mtime, name, path));
        }
    }
    Ok(best.map(|(_, _, path)| path))
}

/// Sort key for one capture file name.
///
/// Files carrying an elapsed token order chronologically and before any file
/// lacking one; untimed files fall back to lexicographic name order. The raw
/// name is the final tie-break in both groups.
#[derive(Debug, PartialEq)]
enum SortKey {
    Timed(f64),
    Untimed(String),
}

impl SortKey {
    fn for_name(name: &str) -> Self {
        match elapsed_token(name) {
            Some(secs) => SortKey::Timed(secs),
            None => SortKey::Untimed(name.to_string()),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Timed(a), SortKey::Timed(b)) => a.total_cmp(b),
            (SortKey::Timed(_), SortKey::Untimed(_)) => Ordering::Less,
            (SortKey::Untimed(_), SortKey::Timed(_)) => Ordering::Greater,
            (SortKey::Untimed(a), SortKey::Untimed(b)) => a.cmp(b),
        }
    }
}

/// Extract the elapsed seconds token (`<digits>.<digits>s`) from a file name
pub fn elapsed_token(name: &str) -> Option<f64> {
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i < bytes.len() && bytes[i] == b'.' {
                let dot = i;
                i += 1;
                let frac_start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i > frac_start && i < bytes.len() && bytes[i] == b's' {
                    return name[start..i].parse().ok();
                }
                // Not a token; resume scanning after the dot
                i = dot + 1;
            }
        } else {
            i += 1;
        }
    }
    None
}

/// List the run folder's PNG files in timeline order
fn ordered_captures(run_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(run_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().map(|e| e == "png").unwrap_or(false) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| {
        let an = file_name(a);
        let bn = file_name(b);
        SortKey::for_name(&an)
            .compare(&SortKey::for_name(&bn))
            .then_with(|| an.cmp(&bn))
    });
    Ok(images)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Derive a card title from a capture file name: drop the extension and
/// replace separators with spaces
fn humanize(name: &str) -> String {
    let stem = name.strip_suffix(".png").unwrap_or(name);
    stem.replace(['-', '_'], " ")
}

/// Resolve a possibly-relative path against the current working directory
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Compute `target` relative to `base_dir` by stripping the common prefix.
///
/// Both inputs are resolved to absolute paths first, so disjoint relative
/// paths still diff correctly; the verbatim fallback only remains for paths
/// with different roots, where no relative form exists.
fn relative_from(base_dir: &Path, target: &Path) -> PathBuf {
    let base_dir = absolutize(base_dir);
    let target = absolutize(target);
    let base: Vec<Component> = base_dir.components().collect();
    let targ: Vec<Component> = target.components().collect();

    let common = base
        .iter()
        .zip(targ.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 && base.first() != targ.first() {
        return target.to_path_buf();
    }

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &targ[common..] {
        rel.push(component.as_os_str());
    }
    rel
}

/// Escape text for inclusion in HTML bodies and attributes
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the full report document
fn render_html(reports_dir: &Path, images: &[PathBuf], errors: &[ErrorRecord]) -> String {
    let mut cards = String::new();
    for (index, image) in images.iter().enumerate() {
        let name = file_name(image);
        let title = escape_html(&humanize(&name));
        let src = relative_from(reports_dir, image);
        cards.push_str(&format!(
            r#"    <div class="screenshot-container">
      <div class="screenshot-header">Step {}: {}</div>
      <div class="screenshot-image">
        <img src="{}" alt="{}" />
      </div>
    </div>
"#,
            index + 1,
            title,
            escape_html(&src.to_string_lossy()),
            title,
        ));
    }

    let errors_section = if errors.is_empty() {
        r#"  <p class="no-errors">No errors recorded during the run.</p>"#.to_string()
    } else {
        let mut items = String::new();
        for error in errors {
            items.push_str(&format!(
                r#"    <div class="error-card">
      <div class="error-message">{}</div>
      <pre class="error-stack">{}</pre>
    </div>
"#,
                escape_html(&error.message),
                escape_html(&error.stack),
            ));
        }
        format!("  <div class=\"errors\">\n{items}  </div>")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Visual load report</title>
  <style>
    body {{
      font-family: Arial, sans-serif;
      line-height: 1.6;
      max-width: 1200px;
      margin: 0 auto;
      padding: 20px;
    }}
    h1 {{
      color: #e31837;
      text-align: center;
    }}
    .timeline {{
      display: flex;
      flex-direction: column;
      gap: 30px;
      margin: 40px 0;
    }}
    .screenshot-container {{
      border: 1px solid #ddd;
      border-radius: 8px;
      overflow: hidden;
      box-shadow: 0 2px 10px rgba(0,0,0,0.1);
    }}
    .screenshot-header {{
      background-color: #f5f5f5;
      padding: 10px 15px;
      border-bottom: 1px solid #ddd;
      font-weight: bold;
    }}
    .screenshot-image {{
      padding: 15px;
      text-align: center;
    }}
    .screenshot-image img {{
      max-width: 100%;
      height: auto;
      border: 1px solid #eee;
    }}
    .error-card {{
      border: 1px solid #e31837;
      border-radius: 8px;
      margin: 15px 0;
      padding: 10px 15px;
    }}
    .error-message {{
      font-weight: bold;
      color: #e31837;
    }}
    .error-stack {{
      background-color: #f5f5f5;
      padding: 10px;
      overflow-x: auto;
    }}
  </style>
</head>
<body>
  <h1>Visual load report</h1>

  <p>This report shows the visual progression of the homepage load, one capture per checkpoint.</p>

  <div class="timeline">
{cards}  </div>

  <h2>Errors</h2>
{errors_section}
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread::sleep;
    use std::time::Duration;

    fn artifacts(root: &Path) -> ArtifactSettings {
        ArtifactSettings::in_root(root)
    }

    #[test]
    fn test_elapsed_token() {
        assert_eq!(elapsed_token("header-loaded-3.42s.png"), Some(3.42));
        assert_eq!(elapsed_token("step1-0.50s.png"), Some(0.50));
        assert_eq!(elapsed_token("12.5s"), Some(12.5));
        assert_eq!(elapsed_token("before-visit.png"), None);
        assert_eq!(elapsed_token("v1.2-notes.png"), None);
        assert_eq!(elapsed_token("release-1.2.3s.png"), Some(2.3));
    }

    #[test]
    fn test_sort_policy_timed_before_untimed() {
        let mut names = vec![
            "zz-untimed.png".to_string(),
            "step2-1.20s.png".to_string(),
            "aa-untimed.png".to_string(),
            "step1-0.50s.png".to_string(),
        ];
        names.sort_by(|a, b| {
            SortKey::for_name(a)
                .compare(&SortKey::for_name(b))
                .then_with(|| a.cmp(b))
        });
        assert_eq!(
            names,
            vec![
                "step1-0.50s.png",
                "step2-1.20s.png",
                "aa-untimed.png",
                "zz-untimed.png",
            ]
        );
    }

    #[test]
    fn test_missing_screenshots_root_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outcome = generate_visual_report(&artifacts(dir.path())).expect("generate");
        assert!(matches!(outcome, ReportOutcome::NothingToReport(_)));
        assert!(!artifacts(dir.path()).report_path().exists());
    }

    #[test]
    fn test_empty_screenshots_root_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = artifacts(dir.path());
        fs::create_dir_all(a.screenshots_root()).expect("mkdir");

        let outcome = generate_visual_report(&a).expect("generate");
        assert!(matches!(outcome, ReportOutcome::NothingToReport(_)));
        assert!(!a.report_path().exists());
    }

    #[test]
    fn test_empty_run_folder_is_noop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = artifacts(dir.path());
        fs::create_dir_all(a.screenshots_root().join("run_a")).expect("mkdir");

        let outcome = generate_visual_report(&a).expect("generate");
        assert!(matches!(outcome, ReportOutcome::NothingToReport(_)));
        assert!(!a.report_path().exists());
    }

    #[test]
    fn test_latest_run_folder_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = artifacts(dir.path());
        let root = a.screenshots_root();

        let older = root.join("run_older");
        fs::create_dir_all(&older).expect("mkdir");
        fs::write(older.join("old-0.10s.png"), b"old").expect("write");

        // mtime resolution is fine-grained on Linux but give it headroom
        sleep(Duration::from_millis(50));

        let newer = root.join("run_newer");
        fs::create_dir_all(&newer).expect("mkdir");
        fs::write(newer.join("new-0.10s.png"), b"new").expect("write");

        let outcome = generate_visual_report(&a).expect("generate");
        let ReportOutcome::Written(path) = outcome else {
            panic!("expected a written report");
        };
        let html = fs::read_to_string(path).expect("read");
        assert!(html.contains("run_newer"));
        assert!(!html.contains("run_older"));
    }

    #[test]
    fn test_images_render_in_elapsed_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = artifacts(dir.path());
        let run = a.screenshots_root().join("run_a");
        fs::create_dir_all(&run).expect("mkdir");
        fs::write(run.join("step2-1.20s.png"), b"b").expect("write");
        fs::write(run.join("step1-0.50s.png"), b"a").expect("write");

        let ReportOutcome::Written(path) = generate_visual_report(&a).expect("generate") else {
            panic!("expected a written report");
        };
        let html = fs::read_to_string(path).expect("read");
        let first = html.find("step1 0.50s").expect("step1 card");
        let second = html.find("step2 1.20s").expect("step2 card");
        assert!(first < second, "step1 must precede step2");
    }

    #[test]
    fn test_errors_placeholder_without_error_log() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = artifacts(dir.path());
        let run = a.screenshots_root().join("run_a");
        fs::create_dir_all(&run).expect("mkdir");
        fs::write(run.join("only-0.10s.png"), b"x").expect("write");

        let ReportOutcome::Written(path) = generate_visual_report(&a).expect("generate") else {
            panic!("expected a written report");
        };
        let html = fs::read_to_string(path).expect("read");
        assert!(html.contains("No errors recorded during the run."));
    }

    #[test]
    fn test_errors_render_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = artifacts(dir.path());
        let run = a.screenshots_root().join("run_a");
        fs::create_dir_all(&run).expect("mkdir");
        fs::write(run.join("only-0.10s.png"), b"x").expect("write");
        crate::errlog::flush(
            &a.errors_path(),
            &[ErrorRecord::new("boom happened", "at homepage.js:12")],
        )
        .expect("flush");

        let ReportOutcome::Written(path) = generate_visual_report(&a).expect("generate") else {
            panic!("expected a written report");
        };
        let html = fs::read_to_string(path).expect("read");
        assert!(html.contains("boom happened"));
        assert!(html.contains("at homepage.js:12"));
        assert!(!html.contains("No errors recorded"));
    }

    #[test]
    fn test_relative_from() {
        assert_eq!(
            relative_from(
                Path::new("/tmp/pv/reports"),
                Path::new("/tmp/pv/screenshots/run_a/x.png")
            ),
            PathBuf::from("../screenshots/run_a/x.png")
        );
        assert_eq!(
            relative_from(Path::new("a/reports"), Path::new("a/screenshots/x.png")),
            PathBuf::from("../screenshots/x.png")
        );
    }

    #[test]
    fn test_relative_from_disjoint_relative_paths() {
        // Paths with no shared literal prefix still diff via the working
        // directory instead of falling back to a broken verbatim src
        assert_eq!(
            relative_from(Path::new("reports"), Path::new("screenshots/run_a/x.png")),
            PathBuf::from("../screenshots/run_a/x.png")
        );
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("after-consent-2.10s.png"), "after consent 2.10s");
        assert_eq!(humanize("page_complete.png"), "page complete");
    }
}
