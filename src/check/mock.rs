//! A scripted in-memory page driver.
//!
//! Used by the test suite and the CLI `--mock` flag to exercise the whole
//! check-and-report pipeline without a browser. Present selectors, page texts
//! and page errors are configured up front; screenshots are solid-color
//! placeholder frames whose shade advances with every capture so consecutive
//! files differ.

use image::{ImageBuffer, RgbImage};
use std::io::Cursor;
use std::time::Duration;

use super::types::{CheckError, CheckResult, ResourceEntry};
use super::PageDriver;
use crate::errlog::ErrorRecord;

/// Scripted page driver rendering placeholder frames
#[derive(Debug, Clone)]
pub struct MockPage {
    present: Vec<String>,
    texts: Vec<String>,
    page_errors: Vec<ErrorRecord>,
    resources: Vec<ResourceEntry>,
    navigate_ok: bool,
    image_stats: (usize, usize),
    timings: Option<(u64, u64)>,
    width: u32,
    height: u32,
    frame: u8,
}

impl MockPage {
    /// Create a mock page with nothing present
    pub fn new() -> Self {
        Self {
            present: Vec::new(),
            texts: Vec::new(),
            page_errors: Vec::new(),
            resources: Vec::new(),
            navigate_ok: true,
            image_stats: (0, 0),
            timings: Some((120, 480)),
            width: 320,
            height: 200,
            frame: 0,
        }
    }

    /// Mark a selector as present on the page
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.present.push(selector.into());
        self
    }

    /// Mark several selectors as present
    pub fn with_selectors(mut self, selectors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.present.extend(selectors.into_iter().map(Into::into));
        self
    }

    /// Add a text fragment the page body contains
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.texts.push(text.into());
        self
    }

    /// Queue a page runtime error to be drained during the run
    pub fn with_page_error(mut self, message: impl Into<String>, stack: impl Into<String>) -> Self {
        self.page_errors.push(ErrorRecord::new(message, stack));
        self
    }

    /// Add a loaded resource reported by the resource timing readout
    pub fn with_resource(
        mut self,
        url: impl Into<String>,
        kind: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        self.resources.push(ResourceEntry {
            url: url.into(),
            kind: kind.into(),
            duration_ms,
        });
        self
    }

    /// Make navigation fail
    pub fn failing_navigation(mut self) -> Self {
        self.navigate_ok = false;
        self
    }

    /// Set the reported (loaded, total) image counts
    pub fn with_image_stats(mut self, loaded: usize, total: usize) -> Self {
        self.image_stats = (loaded, total);
        self
    }

    /// Set the placeholder frame size
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Whether any alternative in a comma-separated selector list is present
    fn matches(&self, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .any(|alt| self.present.iter().any(|p| p == alt))
    }

    fn render_frame(&mut self) -> CheckResult<Vec<u8>> {
        self.frame = self.frame.wrapping_add(16);
        let shade = self.frame;
        let img: RgbImage = ImageBuffer::from_fn(self.width, self.height, |_, _| {
            image::Rgb([shade, shade / 2, 64])
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| CheckError::Driver(format!("Failed to encode frame: {}", e)))?;
        Ok(bytes)
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDriver for MockPage {
    fn goto(&mut self, url: &str) -> CheckResult<()> {
        if self.navigate_ok {
            Ok(())
        } else {
            Err(CheckError::Driver(format!("navigation to {} failed", url)))
        }
    }

    fn wait_visible(&mut self, selector: &str, timeout: Duration) -> CheckResult<()> {
        if self.matches(selector) {
            Ok(())
        } else {
            Err(CheckError::Driver(format!(
                "element '{}' not visible within {:?}",
                selector, timeout
            )))
        }
    }

    fn wait_text(&mut self, text: &str, timeout: Duration) -> CheckResult<()> {
        if self.texts.iter().any(|t| t == text) {
            Ok(())
        } else {
            Err(CheckError::Driver(format!(
                "text \"{}\" not found within {:?}",
                text, timeout
            )))
        }
    }

    fn exists(&mut self, selector: &str) -> bool {
        self.matches(selector)
    }

    fn click(&mut self, selector: &str) -> CheckResult<()> {
        if self.matches(selector) {
            Ok(())
        } else {
            Err(CheckError::Driver(format!("no element '{}' to click", selector)))
        }
    }

    fn screenshot(&mut self) -> CheckResult<Vec<u8>> {
        self.render_frame()
    }

    fn image_stats(&mut self) -> CheckResult<(usize, usize)> {
        Ok(self.image_stats)
    }

    fn resource_entries(&mut self) -> CheckResult<Vec<ResourceEntry>> {
        Ok(self.resources.clone())
    }

    fn load_timings(&mut self) -> Option<(u64, u64)> {
        self.timings
    }

    fn drain_page_errors(&mut self) -> Vec<ErrorRecord> {
        std::mem::take(&mut self.page_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matching_handles_alternatives() {
        let mut page = MockPage::new().with_selector("nav");
        assert!(page.exists("nav, [role=\"navigation\"]"));
        assert!(!page.exists("footer"));
    }

    #[test]
    fn test_frames_are_valid_png_and_vary() {
        let mut page = MockPage::new().with_frame_size(16, 16);
        let a = page.screenshot().expect("frame a");
        let b = page.screenshot().expect("frame b");
        assert!(image::load_from_memory(&a).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_page_errors_drain_once() {
        let mut page = MockPage::new().with_page_error("boom", "stack");
        assert_eq!(page.drain_page_errors().len(), 1);
        assert!(page.drain_page_errors().is_empty());
    }
}
