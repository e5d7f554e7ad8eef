use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use swimscout_common::Config;
use swimscout_scout::classify::VisionClassifier;
use swimscout_scout::pipeline::runner::BatchRunner;
use swimscout_scout::report::ReportWriter;
use swimscout_scout::session::{ensure_session, Authenticator, Credentials, SessionStore};
use vision_client::VisionClient;
use webdriver_client::Driver;

#[derive(Parser)]
#[command(
    name = "swimscout",
    about = "Harvest image posts from Instagram profiles and classify them for swimwear"
)]
struct Cli {
    /// Posts to analyze per profile (overrides MAX_POSTS_PER_PROFILE)
    #[arg(long)]
    max_posts: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one profile
    Single {
        /// Target profile; falls back to TARGET_INSTAGRAM_USERNAME
        username: Option<String>,
    },
    /// Analyze every profile listed in the usernames file
    Batch {
        /// Usernames file, one profile per line (overrides USERNAMES_FILE)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("swimscout_scout=info".parse()?),
        )
        .init();

    info!("Swimscout starting...");

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_redacted();

    let driver = Arc::new(
        Driver::connect(&config.webdriver_url, config.headless)
            .await
            .context("Failed to start WebDriver session")?,
    );

    // Interrupts stop the run at the next profile boundary; already
    // persisted results stay intact.
    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current profile");
                cancelled.store(true, Ordering::Relaxed);
            }
        });
    }

    let outcome = run(&cli, &config, driver.clone(), cancelled).await;

    if let Err(e) = driver.close().await {
        warn!(error = %e, "Failed to close browser session");
    }

    outcome
}

async fn run(
    cli: &Cli,
    config: &Config,
    driver: Arc<Driver>,
    cancelled: Arc<AtomicBool>,
) -> Result<()> {
    let store = SessionStore::new(&config.session_file);
    let auth = Authenticator::new(Credentials {
        username: config.account_username.clone(),
        password: config.account_password.clone(),
    });
    ensure_session(driver.as_ref(), &store, &auth).await?;

    let classifier = VisionClassifier::new(
        VisionClient::new(&config.openai_api_key),
        config.vision_model.clone(),
    );
    let max_posts = cli.max_posts.unwrap_or(config.max_posts_per_profile);
    let runner = BatchRunner::new(
        driver,
        Arc::new(classifier),
        ReportWriter::new(&config.results_dir),
        config.images_dir.clone(),
        max_posts,
        cancelled,
    );

    match &cli.command {
        Command::Single { username } => {
            let target = username
                .clone()
                .or_else(|| config.target_username.clone())
                .context("No target profile: pass a username or set TARGET_INSTAGRAM_USERNAME")?;
            runner.run_single(&target).await?;
        }
        Command::Batch { file } => {
            let path = file.clone().unwrap_or_else(|| config.usernames_file.clone());
            let usernames = load_usernames(&path)?;
            runner.run_batch(&usernames).await?;
        }
    }
    Ok(())
}

fn load_usernames(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read usernames file {}", path.display()))?;
    let usernames: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    anyhow::ensure!(!usernames.is_empty(), "No usernames to process in {}", path.display());
    Ok(usernames)
}
