mod types;

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use types::{ChatRequest, ChatResponse, ContentPart, WireMessage};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Minimal OpenAI chat-completions client for vision questions: one image,
/// one closed-form question, one short reply.
pub struct VisionClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl VisionClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Submit one image and one question, returning the model's raw reply.
    pub async fn ask_about_image(
        &self,
        model: &str,
        question: &str,
        image_png: &[u8],
        max_tokens: u32,
    ) -> Result<String> {
        let encoded = STANDARD.encode(image_png);
        let request = ChatRequest {
            model: model.to_string(),
            max_tokens,
            messages: vec![WireMessage::user(vec![
                ContentPart::text(question),
                ContentPart::image_data_url(format!("data:image/png;base64,{encoded}")),
            ])],
        };

        let url = format!("{}/chat/completions", self.base_url);

        debug!(model, image_bytes = image_png.len(), "Vision chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("No response from model"))
    }
}
