// Trait abstractions for the pipeline's external collaborators.
//
// ProfileBrowser is the one browsing session every component drives.
// Classifier is the vision decision point.
//
// Production impls: webdriver_client::Driver (bridged below) and
// classify::VisionClassifier. Test impls live in testing.rs
// (ScriptedBrowser, FixedClassifier): no browser, no network.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use swimscout_common::{Artifact, Label};
use webdriver_client::{Driver, StoredCookie};

/// How long a best-effort interstitial dismissal may wait for its button.
const DISMISS_TIMEOUT: Duration = Duration::from_secs(5);

/// Settle applied inside an artifact capture after the image page loads.
const CAPTURE_SETTLE: Duration = Duration::from_secs(1);

/// One anchor currently rendered on a profile page: the post link, its
/// preview image source (if any), and whether a clip/reel/video icon marker
/// sits adjacent to it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderedAnchor {
    pub href: String,
    pub img_src: Option<String>,
    pub video_marker: bool,
}

// ---------------------------------------------------------------------------
// ProfileBrowser
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProfileBrowser: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Replace the content of the input matched by `css`.
    async fn fill(&self, css: &str, value: &str) -> Result<()>;

    async fn click(&self, css: &str) -> Result<()>;

    /// Best-effort dismissal of an interstitial button by its label.
    /// Absence is not an error; never raises.
    async fn try_dismiss_button(&self, label: &str) -> bool;

    /// Wait up to `timeout` for an element matching `css`.
    async fn wait_for(&self, css: &str, timeout: Duration) -> bool;

    /// Enumerate the post anchors currently present in the DOM.
    async fn rendered_anchors(&self) -> Result<Vec<RenderedAnchor>>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    async fn scroll_height(&self) -> Result<u64>;

    /// Open `url` in a short-lived auxiliary viewport and snapshot it to
    /// `dest`. The viewport is released on success and failure alike.
    async fn capture_page(&self, url: &str, dest: &Path) -> Result<()>;

    async fn export_cookies(&self) -> Result<Vec<StoredCookie>>;

    /// Install cookies into the current context. The browser must already
    /// be on the cookies' origin.
    async fn import_cookies(&self, cookies: &[StoredCookie]) -> Result<()>;

    /// Fixed settle pause between page interactions. Mocks override this to
    /// a no-op so tests run without real waits.
    async fn settle(&self, wait: Duration) {
        tokio::time::sleep(wait).await;
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one artifact. Failures are absorbed into `Label::Error` and
    /// never raised past this boundary.
    async fn classify(&self, artifact: &Artifact) -> Label;
}

// ---------------------------------------------------------------------------
// ProfileBrowser for Driver
// ---------------------------------------------------------------------------

/// Maps every rendered post anchor to its link, preview image source, and
/// adjacent clip/reel/video icon markers in one round trip.
const ANCHOR_SCRIPT: &str = r#"
return Array.from(document.querySelectorAll('a[href*="/p/"], a[href*="/reel/"]')).map(function (a) {
    var img = a.querySelector('img');
    var scope = a.parentElement || a;
    var marker = scope.querySelector(
        'svg[aria-label*="Clip"], svg[aria-label*="Reel"], svg[aria-label*="Video"], svg[aria-label*="Клип"]'
    );
    return {
        href: a.getAttribute('href') || '',
        img_src: img ? img.getAttribute('src') : null,
        video_marker: marker !== null
    };
});
"#;

#[async_trait]
impl ProfileBrowser for Driver {
    async fn goto(&self, url: &str) -> Result<()> {
        Ok(Driver::goto(self, url).await?)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(Driver::current_url(self).await?)
    }

    async fn fill(&self, css: &str, value: &str) -> Result<()> {
        Ok(Driver::fill(self, css, value).await?)
    }

    async fn click(&self, css: &str) -> Result<()> {
        Ok(Driver::click(self, css).await?)
    }

    async fn try_dismiss_button(&self, label: &str) -> bool {
        self.click_button_with_text(label, DISMISS_TIMEOUT).await
    }

    async fn wait_for(&self, css: &str, timeout: Duration) -> bool {
        self.wait_for_css(css, timeout).await
    }

    async fn rendered_anchors(&self) -> Result<Vec<RenderedAnchor>> {
        let value = self.execute(ANCHOR_SCRIPT, vec![]).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        let value = self
            .execute("return document.body.scrollHeight;", vec![])
            .await?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|h| h as u64))
            .ok_or_else(|| anyhow!("scrollHeight is not numeric: {value}"))
    }

    async fn capture_page(&self, url: &str, dest: &Path) -> Result<()> {
        Ok(Driver::capture_page(self, url, dest, CAPTURE_SETTLE).await?)
    }

    async fn export_cookies(&self) -> Result<Vec<StoredCookie>> {
        Ok(Driver::export_cookies(self).await?)
    }

    async fn import_cookies(&self, cookies: &[StoredCookie]) -> Result<()> {
        Ok(Driver::import_cookies(self, cookies).await?)
    }
}
