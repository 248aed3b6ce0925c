//! Batch runner
//!
//! Validates several coupons against one site, one run after another. Runs
//! share the browser profile directory, so they never overlap. Each run gets
//! its own output directory under the batch root.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use super::artifacts::ArtifactWriter;
use super::error::ExecutorError;
use super::executor::Executor;
use crate::site::SiteConfig;

/// Pause between two consecutive runs
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub coupon: String,
    pub coupon_is_valid: bool,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.coupon_is_valid).count()
    }

    pub fn any_valid(&self) -> bool {
        self.valid_count() > 0
    }
}

pub struct BatchRunner {
    executor: Executor,
    delay: Duration,
}

impl BatchRunner {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn run(
        &self,
        site: &SiteConfig,
        coupons: &[String],
        output_root: &Path,
    ) -> Result<BatchResult, ExecutorError> {
        let mut result = BatchResult::default();

        for (idx, coupon) in coupons.iter().enumerate() {
            info!("Validating coupon {}/{}: {}", idx + 1, coupons.len(), coupon);

            let output_dir = output_root.join(run_dir_name(idx + 1, coupon));
            let run = self
                .executor
                .run(site, coupon, &ArtifactWriter::new(&output_dir))
                .await?;

            result.entries.push(BatchEntry {
                coupon: coupon.clone(),
                coupon_is_valid: run.coupon_is_valid,
                output_dir,
            });

            if idx + 1 < coupons.len() {
                info!("⏳ Waiting {}s before next coupon...", self.delay.as_secs());
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(result)
    }
}

/// `<index>-<coupon>` with anything outside `[A-Za-z0-9_-]` replaced
pub fn run_dir_name(index: usize, coupon: &str) -> String {
    let sanitized: String = coupon
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}", index, sanitized)
}
