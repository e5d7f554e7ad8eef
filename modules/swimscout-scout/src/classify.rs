//! Vision classification: one fixed binary question per artifact.

use async_trait::async_trait;
use tracing::warn;

use swimscout_common::{Artifact, Label, SwimscoutError};
use vision_client::VisionClient;

use crate::traits::Classifier;

/// The fixed closed-form question put to the vision model for every artifact.
const QUESTION: &str = "Is the person in this image wearing a swimsuit (bikini, swimsuit, \
                        bathing suit)? Answer only 'YES' or 'NO'. If there's no person in the \
                        image, answer 'NO'.";

/// Reply budget: the answer is a single token either way.
const REPLY_TOKENS: u32 = 10;

/// Tokens accepted as an affirmative reply.
const AFFIRMATIVE: [&str; 2] = ["YES", "WEARING"];

/// Normalize a free-text model reply into the closed label set. Matching is
/// case-insensitive; ambiguous and empty replies resolve to `Negative`, not
/// `Error`.
pub fn normalize_reply(reply: &str) -> Label {
    let upper = reply.trim().to_uppercase();
    if AFFIRMATIVE.iter().any(|token| upper.contains(token)) {
        Label::Positive
    } else {
        Label::Negative
    }
}

pub struct VisionClassifier {
    client: VisionClient,
    model: String,
}

impl VisionClassifier {
    pub fn new(client: VisionClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    async fn ask(&self, artifact: &Artifact) -> Result<String, SwimscoutError> {
        let bytes = tokio::fs::read(&artifact.path)
            .await
            .map_err(|e| SwimscoutError::Classification(format!("cannot read artifact: {e}")))?;
        self.client
            .ask_about_image(&self.model, QUESTION, &bytes, REPLY_TOKENS)
            .await
            .map_err(|e| SwimscoutError::Classification(e.to_string()))
    }
}

#[async_trait]
impl Classifier for VisionClassifier {
    /// One request, no retry; a transient failure is recorded as `Error`
    /// for this artifact and never raised.
    async fn classify(&self, artifact: &Artifact) -> Label {
        match self.ask(artifact).await {
            Ok(reply) => normalize_reply(&reply),
            Err(e) => {
                warn!(path = %artifact.path.display(), error = %e, "Classification failed");
                Label::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::image_post;

    #[test]
    fn affirmative_replies_are_positive() {
        assert_eq!(normalize_reply("YES"), Label::Positive);
        assert_eq!(normalize_reply("yes"), Label::Positive);
        assert_eq!(normalize_reply(" Yes. "), Label::Positive);
    }

    #[test]
    fn everything_else_is_negative() {
        assert_eq!(normalize_reply("NO"), Label::Negative);
        assert_eq!(normalize_reply("definitely not"), Label::Negative);
        assert_eq!(normalize_reply(""), Label::Negative);
        assert_eq!(normalize_reply("I cannot tell"), Label::Negative);
    }

    #[tokio::test]
    async fn unreadable_artifact_classifies_as_error() {
        let classifier = VisionClassifier::new(VisionClient::new("test-key"), "gpt-4o");
        let artifact = Artifact {
            post: image_post("/p/a/", "https://cdn.example/a.jpg"),
            path: "/nonexistent/missing.png".into(),
        };

        assert_eq!(classifier.classify(&artifact).await, Label::Error);
    }
}
