use std::env;
use std::path::PathBuf;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Instagram account
    pub account_username: String,
    pub account_password: String,

    // Vision model
    pub openai_api_key: String,
    pub vision_model: String,

    // Browser
    pub webdriver_url: String,
    pub headless: bool,

    // Targets
    pub target_username: Option<String>,
    pub usernames_file: PathBuf,
    pub max_posts_per_profile: usize,

    // Paths
    pub images_dir: PathBuf,
    pub results_dir: PathBuf,
    pub session_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            account_username: required_env("INSTAGRAM_USERNAME"),
            account_password: required_env("INSTAGRAM_PASSWORD"),
            openai_api_key: required_env("OPENAI_API_KEY"),
            vision_model: env::var("VISION_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            webdriver_url: env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| "http://localhost:9515".to_string()),
            headless: env::var("HEADLESS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            target_username: env::var("TARGET_INSTAGRAM_USERNAME")
                .ok()
                .filter(|v| !v.is_empty()),
            usernames_file: env::var("USERNAMES_FILE")
                .unwrap_or_else(|_| "usernames.txt".to_string())
                .into(),
            max_posts_per_profile: env::var("MAX_POSTS_PER_PROFILE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("MAX_POSTS_PER_PROFILE must be a number"),
            images_dir: env::var("IMAGES_DIR")
                .unwrap_or_else(|_| "images".to_string())
                .into(),
            results_dir: env::var("RESULTS_DIR").unwrap_or_else(|_| ".".to_string()).into(),
            session_file: env::var("SESSION_FILE")
                .unwrap_or_else(|_| "instagram_session.json".to_string())
                .into(),
        }
    }

    /// Log the loaded configuration with secrets redacted.
    pub fn log_redacted(&self) {
        info!(
            account = %self.account_username,
            model = %self.vision_model,
            webdriver = %self.webdriver_url,
            headless = self.headless,
            max_posts = self.max_posts_per_profile,
            session_file = %self.session_file.display(),
            "Config loaded (password and API key redacted)"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
