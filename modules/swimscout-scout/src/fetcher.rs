//! Artifact fetching: materialize a discovered image as a local snapshot.

use std::path::Path;

use swimscout_common::{Artifact, PostReference, SwimscoutError};

use crate::traits::ProfileBrowser;

/// Resolve a post's image into a stored snapshot under `images_dir`, named
/// from `name_hint`. The image URL is opened as a page and captured
/// visually rather than downloaded as raw bytes; sources that need script
/// execution to render still produce an artifact that way, at the cost of
/// fixed dimensions.
///
/// On failure the caller skips classification for this item and the
/// profile continues.
pub async fn fetch_artifact(
    browser: &dyn ProfileBrowser,
    post: &PostReference,
    images_dir: &Path,
    name_hint: &str,
) -> Result<Artifact, SwimscoutError> {
    std::fs::create_dir_all(images_dir).map_err(|e| {
        SwimscoutError::Fetch(format!(
            "cannot create images directory {}: {e}",
            images_dir.display()
        ))
    })?;

    let path = images_dir.join(format!("{name_hint}.png"));
    browser
        .capture_page(&post.image_url, &path)
        .await
        .map_err(|e| SwimscoutError::Fetch(e.to_string()))?;

    Ok(Artifact {
        post: post.clone(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{image_post, ScriptedBrowser};

    #[tokio::test]
    async fn successful_capture_yields_artifact_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let browser = ScriptedBrowser::new();
        let post = image_post("/p/a/", "https://cdn.example/a.jpg");

        let artifact = fetch_artifact(&browser, &post, dir.path(), "user_1")
            .await
            .expect("capture should succeed");

        assert_eq!(artifact.path, dir.path().join("user_1.png"));
        assert!(artifact.path.exists());
        assert_eq!(artifact.post, post);
    }

    #[tokio::test]
    async fn failed_capture_yields_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let browser = ScriptedBrowser::new().fail_capture("a.jpg");
        let post = image_post("/p/a/", "https://cdn.example/a.jpg");

        let result = fetch_artifact(&browser, &post, dir.path(), "user_1").await;

        assert!(matches!(result, Err(SwimscoutError::Fetch(_))));
        assert!(!dir.path().join("user_1.png").exists());
    }
}
