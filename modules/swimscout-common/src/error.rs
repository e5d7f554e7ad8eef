use thiserror::Error;

/// Failure taxonomy for escaping errors. Session invalidity never escapes
/// (the store recovers it locally into a re-login) and a missing config
/// field is fatal at startup, so neither appears here.
#[derive(Error, Debug)]
pub enum SwimscoutError {
    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Profile error: {0}")]
    Profile(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
