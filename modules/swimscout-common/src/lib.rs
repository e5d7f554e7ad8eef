pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::SwimscoutError;
pub use types::{
    Artifact, BatchSummary, ClassificationResult, Label, MediaKind, PostReference, ProfileResult,
    ProfileStatus,
};
