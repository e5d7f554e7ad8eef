pub mod error;
pub mod types;

pub use error::{DriverError, Result};
pub use types::StoredCookie;

use std::path::Path;
use std::time::Duration;

use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::Value;
use tracing::{debug, warn};

/// Browser window size used for every session. Artifact snapshots inherit
/// these dimensions.
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

/// Typed client over a WebDriver remote endpoint (chromedriver).
///
/// One `Driver` owns one browsing session. The underlying fantoccini client
/// is a cloneable handle, so `&self` methods suffice and `close` can consume
/// a clone.
pub struct Driver {
    client: Client,
}

impl Driver {
    /// Start a new browser session against `webdriver_url`.
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            format!("--window-size={WINDOW_WIDTH},{WINDOW_HEIGHT}"),
        ];
        if headless {
            args.push("--headless=new".to_string());
        }

        let mut caps = serde_json::map::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({ "args": args }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await?;

        debug!(webdriver_url, headless, "WebDriver session started");
        Ok(Self { client })
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))
    }

    pub async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    /// Replace the content of the input matched by `css`.
    pub async fn fill(&self, css: &str, value: &str) -> Result<()> {
        let field = self.client.find(Locator::Css(css)).await?;
        field.clear().await?;
        field.send_keys(value).await?;
        Ok(())
    }

    pub async fn click(&self, css: &str) -> Result<()> {
        self.client.find(Locator::Css(css)).await?.click().await?;
        Ok(())
    }

    /// Best-effort click on a button carrying the given label. Absence is
    /// not an error; returns whether a button was found and clicked.
    pub async fn click_button_with_text(&self, label: &str, timeout: Duration) -> bool {
        let xpath = format!("//button[contains(normalize-space(.), '{label}')]");
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::XPath(&xpath))
            .await
        {
            Ok(button) => match button.click().await {
                Ok(_) => true,
                Err(e) => {
                    debug!(label, error = %e, "Button found but click failed");
                    false
                }
            },
            Err(_) => false,
        }
    }

    /// Wait up to `timeout` for an element matching `css` to appear.
    pub async fn wait_for_css(&self, css: &str, timeout: Duration) -> bool {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(css))
            .await
            .is_ok()
    }

    /// Run a script in the page and return its JSON result.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.client.execute(script, args).await?)
    }

    /// Open `url` in an auxiliary window, snapshot the viewport to `dest`,
    /// and close the window again. The window is closed on failure paths
    /// too; only the close itself is best-effort.
    pub async fn capture_page(&self, url: &str, dest: &Path, settle: Duration) -> Result<()> {
        let original = self.client.window().await?;
        let new_window = self.client.new_window(true).await?;
        self.client.switch_to_window(new_window.handle).await?;

        let capture = self.capture_current(url, dest, settle).await;

        if let Err(e) = self.client.close_window().await {
            warn!(error = %e, "Failed to close auxiliary window");
        }
        self.client.switch_to_window(original).await?;
        capture
    }

    async fn capture_current(&self, url: &str, dest: &Path, settle: Duration) -> Result<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation(e.to_string()))?;
        tokio::time::sleep(settle).await;
        let png = self.client.screenshot().await?;
        tokio::fs::write(dest, png).await?;
        Ok(())
    }

    pub async fn export_cookies(&self) -> Result<Vec<StoredCookie>> {
        let cookies = self.client.get_all_cookies().await?;
        Ok(cookies.iter().map(StoredCookie::from_cookie).collect())
    }

    /// Install cookies into the current browsing context. The browser must
    /// already be on the cookies' domain. Individual rejections are logged
    /// and skipped; a stale cookie set surfaces later as a failed liveness
    /// probe.
    pub async fn import_cookies(&self, cookies: &[StoredCookie]) -> Result<()> {
        for stored in cookies {
            if let Err(e) = self.client.add_cookie(stored.to_cookie()).await {
                debug!(name = %stored.name, error = %e, "Cookie rejected on import");
            }
        }
        Ok(())
    }

    /// End the WebDriver session.
    pub async fn close(&self) -> Result<()> {
        self.client.clone().close().await?;
        Ok(())
    }
}
