//! Session lifecycle: restore a persisted browsing session, probe its
//! liveness, and fall back to interactive login when it is missing or dead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use swimscout_common::SwimscoutError;
use webdriver_client::StoredCookie;

use crate::traits::ProfileBrowser;

pub(crate) const BASE_URL: &str = "https://www.instagram.com";

/// Only present in the authenticated chrome of the home page.
const AUTH_MARKER: &str = r#"svg[aria-label="Home"], a[href="/"]"#;
const AUTH_MARKER_TIMEOUT: Duration = Duration::from_secs(5);
const NAV_LANDMARK: &str = "nav";
const NAV_LANDMARK_TIMEOUT: Duration = Duration::from_secs(1);

const PAGE_SETTLE: Duration = Duration::from_secs(3);
const FORM_SETTLE: Duration = Duration::from_secs(2);
/// Post-login settle. Bounded, not event-driven: the site's post-login DOM
/// signals are unreliable.
const LOGIN_SETTLE: Duration = Duration::from_secs(5);

const COOKIE_BANNER_LABEL: &str = "Allow all cookies";
const POST_LOGIN_DISMISS_LABEL: &str = "Not Now";

const USERNAME_FIELD: &str = r#"input[name="username"]"#;
const PASSWORD_FIELD: &str = r#"input[name="password"]"#;
const SUBMIT_BUTTON: &str = r#"button[type="submit"]"#;

/// Exported authenticated browsing state. Exactly one is live per process.
pub struct Session {
    pub cookies: Vec<StoredCookie>,
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Persists the session blob at a fixed path and decides whether a restored
/// session still grants authenticated access.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Soft restore: `None` when no blob exists or it cannot be parsed.
    /// Never propagates an error.
    pub fn restore(&self) -> Option<Session> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Vec<StoredCookie>>(&raw) {
            Ok(cookies) => Some(Session { cookies }),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Session file unreadable, ignoring");
                None
            }
        }
    }

    /// Overwrite the blob with the browser's current cookie set.
    pub async fn persist(&self, browser: &dyn ProfileBrowser) -> Result<()> {
        let cookies = browser.export_cookies().await?;
        let json = serde_json::to_string_pretty(&cookies)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;
        info!(path = %self.path.display(), cookies = cookies.len(), "Session persisted");
        Ok(())
    }

    /// Liveness probe against the target site. A dead session is deleted on
    /// the spot; restoring it again would be pointless. Never propagates an
    /// error; any failure reads as "not valid".
    pub async fn validate(&self, browser: &dyn ProfileBrowser) -> bool {
        let alive = probe(browser).await;
        if !alive {
            self.discard();
        }
        alive
    }

    /// Delete the persisted blob if present.
    pub fn discard(&self) {
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "Stale session deleted"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to delete session file"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Bounded check that the current browsing context still has authenticated
/// access: authenticated marker appears, no login redirect, nav landmark
/// present.
async fn probe(browser: &dyn ProfileBrowser) -> bool {
    if browser.goto(BASE_URL).await.is_err() {
        return false;
    }
    browser.settle(PAGE_SETTLE).await;

    if !browser.wait_for(AUTH_MARKER, AUTH_MARKER_TIMEOUT).await {
        return false;
    }
    match browser.current_url().await {
        Ok(url) if url.contains("login") => return false,
        Err(_) => return false,
        Ok(_) => {}
    }
    browser.wait_for(NAV_LANDMARK, NAV_LANDMARK_TIMEOUT).await
}

// ---------------------------------------------------------------------------
// Authenticator
// ---------------------------------------------------------------------------

pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub struct Authenticator {
    credentials: Credentials,
}

impl Authenticator {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Interactive login. Success is inferred after the settle interval and
    /// the session is persisted unconditionally; the next liveness probe is
    /// the real arbiter. Failing to reach the form is fatal for the run.
    pub async fn login(&self, browser: &dyn ProfileBrowser, store: &SessionStore) -> Result<()> {
        info!("Logging in with credentials...");

        browser
            .goto(BASE_URL)
            .await
            .map_err(|e| SwimscoutError::Navigation(e.to_string()))?;
        browser.settle(PAGE_SETTLE).await;

        browser.try_dismiss_button(COOKIE_BANNER_LABEL).await;
        browser.settle(FORM_SETTLE).await;

        browser
            .fill(USERNAME_FIELD, &self.credentials.username)
            .await
            .map_err(|e| SwimscoutError::Navigation(e.to_string()))?;
        browser
            .fill(PASSWORD_FIELD, &self.credentials.password)
            .await
            .map_err(|e| SwimscoutError::Navigation(e.to_string()))?;
        browser
            .click(SUBMIT_BUTTON)
            .await
            .map_err(|e| SwimscoutError::Navigation(e.to_string()))?;

        info!("Waiting for login to settle...");
        browser.settle(LOGIN_SETTLE).await;

        browser.try_dismiss_button(POST_LOGIN_DISMISS_LABEL).await;
        browser.try_dismiss_button(POST_LOGIN_DISMISS_LABEL).await;

        store.persist(browser).await?;
        info!("Logged in and session saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ensure_session
// ---------------------------------------------------------------------------

/// Establish an authenticated session, once per run: restore and probe the
/// persisted session if one exists, otherwise (or when the probe fails) log
/// in with credentials. Restore/probe failures are absorbed; only login
/// itself can fail the run.
pub async fn ensure_session(
    browser: &dyn ProfileBrowser,
    store: &SessionStore,
    auth: &Authenticator,
) -> Result<()> {
    if let Some(session) = store.restore() {
        info!(cookies = session.cookies.len(), "Session file found, probing");
        match resume(browser, &session).await {
            Ok(()) => {
                if store.validate(browser).await {
                    info!("Session is valid, already logged in");
                    return Ok(());
                }
                info!("Session expired, logging in with credentials");
            }
            Err(e) => {
                warn!(error = %e, "Failed to resume session");
                store.discard();
            }
        }
    } else {
        info!("No session file found, logging in with credentials");
    }
    auth.login(browser, store).await
}

/// Install restored cookies. Cookies can only be set from their own origin,
/// so navigate there first.
async fn resume(browser: &dyn ProfileBrowser, session: &Session) -> Result<()> {
    browser.goto(BASE_URL).await?;
    browser.import_cookies(&session.cookies).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cookie, ScriptedBrowser};

    fn store_with_session(dir: &tempfile::TempDir) -> SessionStore {
        let path = dir.path().join("session.json");
        let cookies = vec![cookie("sessionid", "abc")];
        std::fs::write(&path, serde_json::to_string(&cookies).unwrap()).unwrap();
        SessionStore::new(path)
    }

    #[tokio::test]
    async fn restore_returns_none_when_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("missing.json"));
        assert!(store.restore().is_none());
    }

    #[tokio::test]
    async fn persist_then_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let browser = ScriptedBrowser::new().with_cookies(vec![cookie("sessionid", "xyz")]);

        store.persist(&browser).await.unwrap();
        let restored = store.restore().expect("session should restore");
        assert_eq!(restored.cookies, vec![cookie("sessionid", "xyz")]);
    }

    #[tokio::test]
    async fn failed_probe_deletes_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_session(&dir);
        let browser = ScriptedBrowser::new().logged_in(false);

        assert!(!store.validate(&browser).await);
        assert!(!store.path().exists(), "dead session must be deleted");
    }

    #[tokio::test]
    async fn login_redirect_fails_probe() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_session(&dir);
        let browser = ScriptedBrowser::new().logged_in(true).redirect_to_login();

        assert!(!store.validate(&browser).await);
    }

    #[tokio::test]
    async fn valid_session_skips_authenticator() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_session(&dir);
        let browser = ScriptedBrowser::new().logged_in(true);
        let auth = Authenticator::new(Credentials {
            username: "acct".to_string(),
            password: "pw".to_string(),
        });

        ensure_session(&browser, &store, &auth).await.unwrap();

        assert!(browser.fill_log().is_empty(), "login form must not be touched");
        assert!(browser.click_log().is_empty());
        assert_eq!(browser.imported_cookies(), vec![cookie("sessionid", "abc")]);
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn invalid_session_forces_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_session(&dir);
        let browser = ScriptedBrowser::new()
            .logged_in(false)
            .with_cookies(vec![cookie("sessionid", "fresh")]);
        let auth = Authenticator::new(Credentials {
            username: "acct".to_string(),
            password: "pw".to_string(),
        });

        ensure_session(&browser, &store, &auth).await.unwrap();

        let fills = browser.fill_log();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].1, "acct");
        assert_eq!(fills[1].1, "pw");
        assert_eq!(browser.click_log(), vec![SUBMIT_BUTTON.to_string()]);
        assert_eq!(
            browser.dismissed(),
            vec![
                COOKIE_BANNER_LABEL.to_string(),
                POST_LOGIN_DISMISS_LABEL.to_string(),
                POST_LOGIN_DISMISS_LABEL.to_string(),
            ]
        );
        // Login persisted the browser's fresh cookies over the stale blob.
        let restored = store.restore().expect("session rewritten");
        assert_eq!(restored.cookies, vec![cookie("sessionid", "fresh")]);
    }
}
