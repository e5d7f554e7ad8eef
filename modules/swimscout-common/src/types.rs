use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// A content item discovered on a profile page. Only `Image` items survive
/// harvesting; `Video` items are recognized so they can be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct PostReference {
    /// Canonical post URL (fully qualified).
    pub post_url: String,
    /// Source URL of the rendered preview image.
    pub image_url: String,
    pub kind: MediaKind,
}

/// A locally materialized image, ready for classification.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub post: PostReference,
    pub path: PathBuf,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Closed label set produced by the classifier. Wire strings match the
/// report format consumed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "WEARING")]
    Positive,
    #[serde(rename = "NOT WEARING")]
    Negative,
    #[serde(rename = "ERROR")]
    Error,
}

impl Label {
    pub fn is_positive(self) -> bool {
        matches!(self, Label::Positive)
    }
}

/// One classified post, in result-list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub post_number: u32,
    pub post_url: String,
    pub image_path: String,
    pub has_swimsuit: Label,
}

// ---------------------------------------------------------------------------
// Per-profile outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Success,
    NoImages,
    Error,
}

/// Finalized record of one profile's run. Built once, persisted, never
/// mutated afterward. Counts are derived from the results list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResult {
    pub username: String,
    pub status: ProfileStatus,
    pub total_posts: u32,
    pub swimsuit_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub results: Vec<ClassificationResult>,
}

impl ProfileResult {
    pub fn success(username: &str, results: Vec<ClassificationResult>) -> Self {
        Self::build(username, ProfileStatus::Success, None, results)
    }

    pub fn no_images(username: &str) -> Self {
        Self::build(username, ProfileStatus::NoImages, None, Vec::new())
    }

    /// Profile-level fault. Keeps whatever results were gathered before it.
    pub fn failed(username: &str, message: String, results: Vec<ClassificationResult>) -> Self {
        Self::build(username, ProfileStatus::Error, Some(message), results)
    }

    fn build(
        username: &str,
        status: ProfileStatus,
        error: Option<String>,
        results: Vec<ClassificationResult>,
    ) -> Self {
        let swimsuit_count = results.iter().filter(|r| r.has_swimsuit.is_positive()).count() as u32;
        Self {
            username: username.to_string(),
            status,
            total_posts: results.len() as u32,
            swimsuit_count,
            error,
            results,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch outcome
// ---------------------------------------------------------------------------

/// Write-once summary of a whole run. Owns its profile results by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub timestamp: DateTime<Utc>,
    pub total_profiles: u32,
    pub successful: u32,
    pub failed: u32,
    pub no_images: u32,
    pub total_posts_analyzed: u32,
    pub total_swimsuit_found: u32,
    pub profiles: Vec<ProfileResult>,
}

impl BatchSummary {
    pub fn new(timestamp: DateTime<Utc>, profiles: Vec<ProfileResult>) -> Self {
        let count = |s: ProfileStatus| profiles.iter().filter(|p| p.status == s).count() as u32;
        Self {
            timestamp,
            total_profiles: profiles.len() as u32,
            successful: count(ProfileStatus::Success),
            failed: count(ProfileStatus::Error),
            no_images: count(ProfileStatus::NoImages),
            total_posts_analyzed: profiles.iter().map(|p| p.total_posts).sum(),
            total_swimsuit_found: profiles.iter().map(|p| p.swimsuit_count).sum(),
            profiles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(n: u32, label: Label) -> ClassificationResult {
        ClassificationResult {
            post_number: n,
            post_url: format!("https://www.instagram.com/p/{n}/"),
            image_path: format!("images/user_{n}.png"),
            has_swimsuit: label,
        }
    }

    #[test]
    fn profile_counts_derive_from_results() {
        let r = ProfileResult::success(
            "user",
            vec![
                result(1, Label::Positive),
                result(2, Label::Negative),
                result(3, Label::Positive),
                result(4, Label::Error),
            ],
        );
        assert_eq!(r.total_posts, 4);
        assert_eq!(r.swimsuit_count, 2);
        assert_eq!(r.status, ProfileStatus::Success);
    }

    #[test]
    fn failed_profile_keeps_partial_results() {
        let r = ProfileResult::failed(
            "user",
            "navigation error".to_string(),
            vec![result(1, Label::Positive)],
        );
        assert_eq!(r.status, ProfileStatus::Error);
        assert_eq!(r.error.as_deref(), Some("navigation error"));
        assert_eq!(r.total_posts, 1);
        assert_eq!(r.swimsuit_count, 1);
    }

    #[test]
    fn wire_strings_match_report_format() {
        assert_eq!(
            serde_json::to_value(Label::Negative).unwrap(),
            serde_json::json!("NOT WEARING")
        );
        assert_eq!(
            serde_json::to_value(ProfileStatus::NoImages).unwrap(),
            serde_json::json!("no_images")
        );
        let r = ProfileResult::no_images("empty_user");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["status"], "no_images");
        assert_eq!(v["total_posts"], 0);
        assert!(v.get("error").is_none(), "absent error must not serialize");
    }

    #[test]
    fn batch_summary_aggregates_by_status() {
        let profiles = vec![
            ProfileResult::success("a", vec![result(1, Label::Positive)]),
            ProfileResult::failed("b", "boom".to_string(), Vec::new()),
            ProfileResult::no_images("c"),
        ];
        let summary = BatchSummary::new(Utc::now(), profiles);
        assert_eq!(summary.total_profiles, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.no_images, 1);
        assert_eq!(summary.total_posts_analyzed, 1);
        assert_eq!(summary.total_swimsuit_found, 1);
    }
}
