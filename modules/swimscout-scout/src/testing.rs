// Test mocks for the pipeline's two trait boundaries:
//
// - ScriptedBrowser (ProfileBrowser): frame-scripted DOM snapshots and
//   scroll heights, call logs for login assertions, no real waits.
// - FixedClassifier (Classifier): post-URL keyed labels.
//
// Plus small helpers for anchors, posts, and cookies.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use swimscout_common::{Artifact, Label, MediaKind, PostReference};
use webdriver_client::StoredCookie;

use crate::traits::{Classifier, ProfileBrowser, RenderedAnchor};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn image_anchor(href: &str, img_src: &str) -> RenderedAnchor {
    RenderedAnchor {
        href: href.to_string(),
        img_src: Some(img_src.to_string()),
        video_marker: false,
    }
}

pub fn video_anchor(href: &str, img_src: &str) -> RenderedAnchor {
    RenderedAnchor {
        href: href.to_string(),
        img_src: Some(img_src.to_string()),
        video_marker: true,
    }
}

pub fn image_post(href: &str, image_url: &str) -> PostReference {
    PostReference {
        post_url: format!("https://www.instagram.com{href}"),
        image_url: image_url.to_string(),
        kind: MediaKind::Image,
    }
}

pub fn cookie(name: &str, value: &str) -> StoredCookie {
    StoredCookie {
        name: name.to_string(),
        value: value.to_string(),
        domain: Some(".instagram.com".to_string()),
        path: Some("/".to_string()),
        secure: true,
        http_only: true,
    }
}

// ---------------------------------------------------------------------------
// ScriptedBrowser
// ---------------------------------------------------------------------------

const LOGIN_REDIRECT_URL: &str = "https://www.instagram.com/accounts/login/";

#[derive(Default)]
struct ScriptedState {
    logged_in: bool,
    redirect_to_login: bool,
    current_url: String,
    goto_log: Vec<String>,
    fill_log: Vec<(String, String)>,
    click_log: Vec<String>,
    dismissed: Vec<String>,
    scrolls: usize,
    anchor_frames: VecDeque<Vec<RenderedAnchor>>,
    current_anchors: Vec<RenderedAnchor>,
    height_frames: VecDeque<u64>,
    current_height: u64,
    cookies: Vec<StoredCookie>,
    imported: Vec<StoredCookie>,
    failing_gotos: HashSet<String>,
    failing_captures: HashSet<String>,
}

/// Scripted stand-in for the browsing session. Each `rendered_anchors` /
/// `scroll_height` call advances to the next scripted frame, modelling
/// content loaded by the preceding scroll; the last frame repeats.
pub struct ScriptedBrowser {
    state: Mutex<ScriptedState>,
}

impl ScriptedBrowser {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptedState {
                logged_in: true,
                current_height: 1000,
                ..ScriptedState::default()
            }),
        }
    }

    pub fn logged_in(self, logged_in: bool) -> Self {
        self.state.lock().unwrap().logged_in = logged_in;
        self
    }

    /// Make every navigation land on the login screen, as the site does for
    /// an expired session.
    pub fn redirect_to_login(self) -> Self {
        self.state.lock().unwrap().redirect_to_login = true;
        self
    }

    pub fn with_anchor_frames(self, frames: Vec<Vec<RenderedAnchor>>) -> Self {
        self.state.lock().unwrap().anchor_frames = frames.into();
        self
    }

    pub fn with_heights(self, heights: Vec<u64>) -> Self {
        self.state.lock().unwrap().height_frames = heights.into();
        self
    }

    pub fn with_cookies(self, cookies: Vec<StoredCookie>) -> Self {
        self.state.lock().unwrap().cookies = cookies;
        self
    }

    /// Navigations to URLs containing `part` fail.
    pub fn fail_goto(self, part: &str) -> Self {
        self.state.lock().unwrap().failing_gotos.insert(part.to_string());
        self
    }

    /// Captures of image URLs containing `part` fail.
    pub fn fail_capture(self, part: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_captures
            .insert(part.to_string());
        self
    }

    pub fn goto_log(&self) -> Vec<String> {
        self.state.lock().unwrap().goto_log.clone()
    }

    pub fn fill_log(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().fill_log.clone()
    }

    pub fn click_log(&self) -> Vec<String> {
        self.state.lock().unwrap().click_log.clone()
    }

    pub fn dismissed(&self) -> Vec<String> {
        self.state.lock().unwrap().dismissed.clone()
    }

    pub fn imported_cookies(&self) -> Vec<StoredCookie> {
        self.state.lock().unwrap().imported.clone()
    }

    pub fn scroll_count(&self) -> usize {
        self.state.lock().unwrap().scrolls
    }
}

#[async_trait]
impl ProfileBrowser for ScriptedBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.goto_log.push(url.to_string());
        if state.failing_gotos.iter().any(|part| url.contains(part.as_str())) {
            bail!("Navigation failed: {url}");
        }
        state.current_url = if state.redirect_to_login {
            LOGIN_REDIRECT_URL.to_string()
        } else {
            url.to_string()
        };
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().current_url.clone())
    }

    async fn fill(&self, css: &str, value: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .fill_log
            .push((css.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, css: &str) -> Result<()> {
        self.state.lock().unwrap().click_log.push(css.to_string());
        Ok(())
    }

    async fn try_dismiss_button(&self, label: &str) -> bool {
        self.state.lock().unwrap().dismissed.push(label.to_string());
        false
    }

    async fn wait_for(&self, _css: &str, _timeout: Duration) -> bool {
        self.state.lock().unwrap().logged_in
    }

    async fn rendered_anchors(&self) -> Result<Vec<RenderedAnchor>> {
        let mut state = self.state.lock().unwrap();
        if let Some(frame) = state.anchor_frames.pop_front() {
            state.current_anchors = frame;
        }
        Ok(state.current_anchors.clone())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.state.lock().unwrap().scrolls += 1;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        if let Some(height) = state.height_frames.pop_front() {
            state.current_height = height;
        }
        Ok(state.current_height)
    }

    async fn capture_page(&self, url: &str, dest: &Path) -> Result<()> {
        {
            let state = self.state.lock().unwrap();
            if state
                .failing_captures
                .iter()
                .any(|part| url.contains(part.as_str()))
            {
                bail!("Capture failed: {url}");
            }
        }
        std::fs::write(dest, b"scripted image bytes")?;
        Ok(())
    }

    async fn export_cookies(&self) -> Result<Vec<StoredCookie>> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }

    async fn import_cookies(&self, cookies: &[StoredCookie]) -> Result<()> {
        self.state.lock().unwrap().imported.extend_from_slice(cookies);
        Ok(())
    }

    /// No real waits in tests.
    async fn settle(&self, _wait: Duration) {}
}

// ---------------------------------------------------------------------------
// FixedClassifier
// ---------------------------------------------------------------------------

/// Returns a fixed label per post URL, with a default for everything else.
pub struct FixedClassifier {
    default: Label,
    by_post_url: HashMap<String, Label>,
    classified: Mutex<Vec<String>>,
}

impl FixedClassifier {
    pub fn new(default: Label) -> Self {
        Self {
            default,
            by_post_url: HashMap::new(),
            classified: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, post_url: &str, label: Label) -> Self {
        self.by_post_url.insert(post_url.to_string(), label);
        self
    }

    /// Post URLs classified, in call order.
    pub fn classified(&self) -> Vec<String> {
        self.classified.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, artifact: &Artifact) -> Label {
        self.classified
            .lock()
            .unwrap()
            .push(artifact.post.post_url.clone());
        self.by_post_url
            .get(&artifact.post.post_url)
            .copied()
            .unwrap_or(self.default)
    }
}
