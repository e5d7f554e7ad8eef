//! Profile harvesting: scroll-driven discovery of image posts.
//!
//! The scroll loop keeps loading content until the requested number of
//! image posts is collected or the page stops growing. Video and reel
//! anchors are recognized by their adjacent icon markers and skipped.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use swimscout_common::{MediaKind, PostReference, SwimscoutError};

use crate::session::BASE_URL;
use crate::traits::{ProfileBrowser, RenderedAnchor};

const PROFILE_SETTLE: Duration = Duration::from_secs(4);
const SCROLL_SETTLE: Duration = Duration::from_secs(2);

/// Minimum collected items before an unchanged scroll height may end the
/// harvest. Tolerates transient stalls in lazy-loading early on.
const STALL_MIN_COLLECTED: usize = 3;
/// Consecutive unchanged heights required to treat loading as exhausted.
const STALL_ROUNDS: u8 = 2;
/// Consecutive unchanged heights after which the harvest ends regardless of
/// count. Profiles with fewer than `STALL_MIN_COLLECTED` image posts
/// (including empty ones) would otherwise never terminate.
const IDLE_ROUNDS: u8 = 5;

// ---------------------------------------------------------------------------
// Termination predicate
// ---------------------------------------------------------------------------

/// Typed termination condition for the scroll loop. The caller checks the
/// reached-limit side; this tracks the stalled-height side.
#[derive(Debug, Default)]
pub(crate) struct ScrollTracker {
    last_height: Option<u64>,
    unchanged: u8,
}

impl ScrollTracker {
    pub fn observe(&mut self, height: u64) {
        if self.last_height == Some(height) {
            self.unchanged = self.unchanged.saturating_add(1);
        } else {
            self.unchanged = 0;
        }
        self.last_height = Some(height);
    }

    pub fn exhausted(&self, collected: usize) -> bool {
        (self.unchanged >= STALL_ROUNDS && collected >= STALL_MIN_COLLECTED)
            || self.unchanged >= IDLE_ROUNDS
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

pub fn profile_url(username: &str) -> String {
    format!("{BASE_URL}/{username}/")
}

fn canonical_post_url(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{BASE_URL}{href}")
    }
}

/// Classify one rendered anchor. An adjacent clip/reel/video marker wins
/// over the preview image; anchors without a preview yield nothing.
fn discover(anchor: &RenderedAnchor) -> Option<PostReference> {
    let image_url = anchor.img_src.as_deref()?;
    let kind = if anchor.video_marker {
        MediaKind::Video
    } else {
        MediaKind::Image
    };
    Some(PostReference {
        post_url: canonical_post_url(&anchor.href),
        image_url: image_url.to_string(),
        kind,
    })
}

/// Collect up to `limit` image posts from a profile, most recent first as
/// rendered by the site. Deduplicates by post URL across scroll iterations;
/// a profile with zero posts returns an empty sequence without error.
pub async fn harvest_profile(
    browser: &dyn ProfileBrowser,
    username: &str,
    limit: usize,
) -> Result<Vec<PostReference>> {
    info!(username, limit, "Harvesting profile");

    browser
        .goto(&profile_url(username))
        .await
        .map_err(|e| SwimscoutError::Navigation(e.to_string()))?;
    browser.settle(PROFILE_SETTLE).await;

    let mut seen: HashSet<String> = HashSet::new();
    let mut collected: Vec<PostReference> = Vec::new();
    let mut tracker = ScrollTracker::default();

    while collected.len() < limit {
        let anchors = browser.rendered_anchors().await?;
        debug!(rendered = anchors.len(), "Post anchors on page");

        for anchor in &anchors {
            if collected.len() >= limit {
                break;
            }
            let Some(post) = discover(anchor) else {
                continue;
            };
            if !seen.insert(post.post_url.clone()) {
                continue;
            }
            match post.kind {
                MediaKind::Video => {
                    debug!(post_url = %post.post_url, "Video post skipped");
                }
                MediaKind::Image if post.image_url.starts_with("http") => {
                    debug!(
                        post_url = %post.post_url,
                        found = collected.len() + 1,
                        limit,
                        "Image post found"
                    );
                    collected.push(post);
                }
                MediaKind::Image => {
                    debug!(post_url = %post.post_url, "Image source not fully qualified, skipped");
                }
            }
        }

        if collected.len() >= limit {
            break;
        }

        browser.scroll_to_bottom().await?;
        browser.settle(SCROLL_SETTLE).await;
        tracker.observe(browser.scroll_height().await?);
        if tracker.exhausted(collected.len()) {
            break;
        }
    }

    info!(username, collected = collected.len(), "Harvest complete");
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{image_anchor, video_anchor, ScriptedBrowser};

    #[test]
    fn tracker_tolerates_transient_stall() {
        let mut tracker = ScrollTracker::default();
        tracker.observe(1000);
        tracker.observe(1000); // one stalled round
        assert!(!tracker.exhausted(5));
        tracker.observe(1200); // growth resets the stall
        assert!(!tracker.exhausted(5));
    }

    #[test]
    fn tracker_stops_after_two_stalled_rounds_with_enough_items() {
        let mut tracker = ScrollTracker::default();
        tracker.observe(1000);
        tracker.observe(1000);
        tracker.observe(1000);
        assert!(tracker.exhausted(3));
        assert!(!tracker.exhausted(2), "needs the minimum item count");
    }

    #[test]
    fn tracker_idle_guard_stops_sparse_profiles() {
        let mut tracker = ScrollTracker::default();
        for _ in 0..6 {
            tracker.observe(800);
        }
        assert!(tracker.exhausted(0));
    }

    #[tokio::test]
    async fn respects_limit_in_encounter_order() {
        let browser = ScriptedBrowser::new().with_anchor_frames(vec![vec![
            image_anchor("/p/a/", "https://cdn.example/a.jpg"),
            image_anchor("/p/b/", "https://cdn.example/b.jpg"),
            image_anchor("/p/c/", "https://cdn.example/c.jpg"),
        ]]);

        let posts = harvest_profile(&browser, "someone", 2).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].post_url, "https://www.instagram.com/p/a/");
        assert_eq!(posts[1].post_url, "https://www.instagram.com/p/b/");
    }

    #[tokio::test]
    async fn deduplicates_reobserved_anchors_across_scrolls() {
        let browser = ScriptedBrowser::new()
            .with_anchor_frames(vec![
                vec![
                    image_anchor("/p/a/", "https://cdn.example/a.jpg"),
                    image_anchor("/p/b/", "https://cdn.example/b.jpg"),
                ],
                vec![
                    // re-enumeration re-observes the first two
                    image_anchor("/p/a/", "https://cdn.example/a.jpg"),
                    image_anchor("/p/b/", "https://cdn.example/b.jpg"),
                    image_anchor("/p/c/", "https://cdn.example/c.jpg"),
                ],
            ])
            .with_heights(vec![1000, 1100, 1100, 1100]);

        let posts = harvest_profile(&browser, "someone", 10).await.unwrap();

        let urls: Vec<&str> = posts.iter().map(|p| p.post_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://www.instagram.com/p/a/",
                "https://www.instagram.com/p/b/",
                "https://www.instagram.com/p/c/",
            ]
        );
    }

    #[tokio::test]
    async fn excludes_video_and_reel_anchors() {
        let browser = ScriptedBrowser::new().with_anchor_frames(vec![vec![
            image_anchor("/p/1/", "https://cdn.example/1.jpg"),
            video_anchor("/reel/2/", "https://cdn.example/2.jpg"),
            image_anchor("/p/3/", "https://cdn.example/3.jpg"),
            video_anchor("/reel/4/", "https://cdn.example/4.jpg"),
            image_anchor("/p/5/", "https://cdn.example/5.jpg"),
            video_anchor("/reel/6/", "https://cdn.example/6.jpg"),
            image_anchor("/p/7/", "https://cdn.example/7.jpg"),
            image_anchor("/p/8/", "https://cdn.example/8.jpg"),
        ]]);

        let posts = harvest_profile(&browser, "someone", 10).await.unwrap();

        assert_eq!(posts.len(), 5, "three reels must be excluded");
        assert!(posts.iter().all(|p| p.kind == MediaKind::Image));
    }

    #[tokio::test]
    async fn relative_image_sources_are_rejected() {
        let browser = ScriptedBrowser::new().with_anchor_frames(vec![vec![
            image_anchor("/p/1/", "/relative/path.jpg"),
            image_anchor("/p/2/", "https://cdn.example/2.jpg"),
            image_anchor("/p/3/", "https://cdn.example/3.jpg"),
            image_anchor("/p/4/", "https://cdn.example/4.jpg"),
        ]]);

        let posts = harvest_profile(&browser, "someone", 10).await.unwrap();

        assert_eq!(posts.len(), 3);
        assert!(posts.iter().all(|p| p.image_url.starts_with("http")));
    }

    #[tokio::test]
    async fn zero_post_profile_returns_empty_without_error() {
        let browser = ScriptedBrowser::new().with_anchor_frames(vec![vec![]]);

        let posts = harvest_profile(&browser, "empty_user", 10).await.unwrap();

        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn navigation_failure_is_an_error() {
        let browser = ScriptedBrowser::new().fail_goto("broken_user");

        let result = harvest_profile(&browser, "broken_user", 5).await;

        assert!(result.is_err());
    }
}
