use swimscout_common::{BatchSummary, ProfileStatus};

/// End-of-run stats block derived from a finished batch summary.
pub struct BatchStats<'a> {
    summary: &'a BatchSummary,
}

impl<'a> From<&'a BatchSummary> for BatchStats<'a> {
    fn from(summary: &'a BatchSummary) -> Self {
        Self { summary }
    }
}

impl std::fmt::Display for BatchStats<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.summary;
        writeln!(f, "\n=== Batch Run Complete ===")?;
        writeln!(f, "Profiles processed: {}", s.total_profiles)?;
        writeln!(f, "Successful:         {}", s.successful)?;
        writeln!(f, "Failed:             {}", s.failed)?;
        writeln!(f, "No images:          {}", s.no_images)?;
        writeln!(f, "Posts analyzed:     {}", s.total_posts_analyzed)?;
        writeln!(f, "Swimsuit found:     {}", s.total_swimsuit_found)?;
        writeln!(f, "\nPer profile:")?;
        for profile in &s.profiles {
            let status = match profile.status {
                ProfileStatus::Success => "success",
                ProfileStatus::NoImages => "no images",
                ProfileStatus::Error => "error",
            };
            write!(
                f,
                "  @{}: {} posts, {} with swimsuit ({status})",
                profile.username, profile.total_posts, profile.swimsuit_count
            )?;
            if let Some(message) = &profile.error {
                write!(f, ": {message}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use swimscout_common::ProfileResult;

    #[test]
    fn renders_counts_and_per_profile_lines() {
        let summary = BatchSummary::new(
            Utc::now(),
            vec![
                ProfileResult::no_images("quiet_user"),
                ProfileResult::failed("broken_user", "navigation error".to_string(), Vec::new()),
            ],
        );
        let rendered = BatchStats::from(&summary).to_string();

        assert!(rendered.contains("Profiles processed: 2"));
        assert!(rendered.contains("@quiet_user: 0 posts, 0 with swimsuit (no images)"));
        assert!(rendered.contains("@broken_user: 0 posts, 0 with swimsuit (error): navigation error"));
    }
}
