//! Run artifacts on disk
//!
//! `result.json` is written for every run that got past configuration.
//! Session runs add `screenshot.png` and `html_snapshot.html`.

use std::path::{Path, PathBuf};

use crate::bridge::BrowserBridge;
use crate::engine::error::ExecutorError;
use crate::engine::result::RunResult;
use crate::site::RunContext;

pub const RESULT_FILE: &str = "result.json";
pub const SCREENSHOT_FILE: &str = "screenshot.png";
pub const HTML_SNAPSHOT_FILE: &str = "html_snapshot.html";

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn result_path(&self) -> PathBuf {
        self.dir.join(RESULT_FILE)
    }

    pub fn screenshot_path(&self) -> PathBuf {
        self.dir.join(SCREENSHOT_FILE)
    }

    pub fn html_snapshot_path(&self) -> PathBuf {
        self.dir.join(HTML_SNAPSHOT_FILE)
    }

    /// Create the output directory if absent
    pub fn prepare(&self) -> Result<(), ExecutorError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn write_result(&self, result: &RunResult) -> Result<(), ExecutorError> {
        let json = serde_json::to_string_pretty(result)?;
        std::fs::write(self.result_path(), json)?;
        Ok(())
    }

    /// Dump the final page state. Failures are logged, never raised.
    pub async fn capture_page(&self, page: &dyn BrowserBridge, ctx: &mut RunContext) {
        match page.content().await {
            Ok(html) => {
                if let Err(e) = std::fs::write(self.html_snapshot_path(), html) {
                    ctx.error(format!("❌ Failed to write HTML snapshot: {}", e));
                }
            }
            Err(e) => ctx.error(format!("❌ Failed to capture HTML snapshot: {}", e)),
        }

        // The helper process resolves relative paths against its own cwd.
        let screenshot = self.screenshot_path();
        let screenshot = std::path::absolute(&screenshot).unwrap_or(screenshot);
        if let Err(e) = page.screenshot(&screenshot, true).await {
            ctx.error(format!("❌ Failed to capture screenshot: {}", e));
        }
    }
}
