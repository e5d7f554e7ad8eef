//! Batch orchestration: drives harvest, fetch, and classify across profiles
//! with per-profile fault isolation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use swimscout_common::{BatchSummary, ClassificationResult, ProfileResult, SwimscoutError};

use crate::fetcher::fetch_artifact;
use crate::harvest::harvest_profile;
use crate::pipeline::stats::BatchStats;
use crate::report::ReportWriter;
use crate::traits::{Classifier, ProfileBrowser};

/// Back-pressure pause between profiles; not a correctness requirement.
const PROFILE_PAUSE: Duration = Duration::from_secs(5);

pub(crate) fn is_cancelled(cancelled: &AtomicBool) -> bool {
    cancelled.load(Ordering::Relaxed)
}

/// Bundles the shared dependencies for a run. One runner serves both the
/// single and the batch mode.
pub struct BatchRunner {
    browser: Arc<dyn ProfileBrowser>,
    classifier: Arc<dyn Classifier>,
    reports: ReportWriter,
    images_dir: PathBuf,
    max_posts: usize,
    cancelled: Arc<AtomicBool>,
    profile_pause: Duration,
}

impl BatchRunner {
    pub fn new(
        browser: Arc<dyn ProfileBrowser>,
        classifier: Arc<dyn Classifier>,
        reports: ReportWriter,
        images_dir: PathBuf,
        max_posts: usize,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            browser,
            classifier,
            reports,
            images_dir,
            max_posts,
            cancelled,
            profile_pause: PROFILE_PAUSE,
        }
    }

    pub fn with_profile_pause(mut self, pause: Duration) -> Self {
        self.profile_pause = pause;
        self
    }

    /// Analyze one profile and persist its document in the results root.
    pub async fn run_single(&self, username: &str) -> Result<ProfileResult> {
        let result = self.process_profile(username).await;
        if let Err(e) = self.reports.write_single(&result) {
            warn!(username, error = %e, "Failed to write results");
        }
        info!(
            username,
            total = result.total_posts,
            swimsuit = result.swimsuit_count,
            "Profile analysis complete"
        );
        Ok(result)
    }

    /// Process profiles strictly in input order. A fault in one profile is
    /// recorded as that profile's error and does not abort the rest. Each
    /// profile's document is persisted as soon as it completes; the summary
    /// follows once all profiles are done.
    pub async fn run_batch(&self, usernames: &[String]) -> Result<BatchSummary> {
        info!(
            profiles = usernames.len(),
            posts_per_profile = self.max_posts,
            "Batch starting"
        );

        let mut profiles: Vec<ProfileResult> = Vec::new();
        for (idx, username) in usernames.iter().enumerate() {
            if is_cancelled(&self.cancelled) {
                info!("Run cancelled, stopping before next profile");
                break;
            }

            info!(
                profile = idx + 1,
                of = usernames.len(),
                username = username.as_str(),
                "Processing profile"
            );
            let result = self.process_profile(username).await;
            if let Err(e) = self.reports.write_profile(&result) {
                warn!(username = username.as_str(), error = %e, "Failed to write profile results");
            }
            profiles.push(result);

            if idx + 1 < usernames.len() && !is_cancelled(&self.cancelled) {
                tokio::time::sleep(self.profile_pause).await;
            }
        }

        let summary = BatchSummary::new(Utc::now(), profiles);
        let path = self.reports.write_summary(&summary)?;
        info!(path = %path.display(), "Batch summary saved");
        info!("{}", BatchStats::from(&summary));
        Ok(summary)
    }

    /// One profile, faults contained: an error anywhere in the flow yields
    /// an error-status result carrying everything gathered before it.
    async fn process_profile(&self, username: &str) -> ProfileResult {
        let mut results = Vec::new();
        match self.classify_posts(username, &mut results).await {
            Ok(0) => {
                info!(username, "No images found");
                ProfileResult::no_images(username)
            }
            Ok(_) => ProfileResult::success(username, results),
            Err(e) => {
                let err = SwimscoutError::Profile(e.to_string());
                warn!(username, error = %err, "Profile processing failed");
                ProfileResult::failed(username, err.to_string(), results)
            }
        }
    }

    /// Returns the number of harvested posts. `results` accumulates the
    /// classified subset in place so a fault keeps partial progress.
    async fn classify_posts(
        &self,
        username: &str,
        results: &mut Vec<ClassificationResult>,
    ) -> Result<usize> {
        let posts = harvest_profile(self.browser.as_ref(), username, self.max_posts).await?;
        if posts.is_empty() {
            return Ok(0);
        }

        info!(username, count = posts.len(), "Analyzing images");
        for (idx, post) in posts.iter().enumerate() {
            let name_hint = format!("{}_{}", username, idx + 1);
            let artifact = match fetch_artifact(
                self.browser.as_ref(),
                post,
                &self.images_dir,
                &name_hint,
            )
            .await
            {
                Ok(artifact) => artifact,
                Err(e) => {
                    // A failed fetch skips this item, not the profile.
                    warn!(post_url = %post.post_url, error = %e, "Skipping post");
                    continue;
                }
            };

            let label = self.classifier.classify(&artifact).await;
            info!(post = idx + 1, of = posts.len(), label = ?label, "Post classified");

            results.push(ClassificationResult {
                post_number: results.len() as u32 + 1,
                post_url: post.post_url.clone(),
                image_path: artifact.path.display().to_string(),
                has_swimsuit: label,
            });
        }
        Ok(posts.len())
    }
}
