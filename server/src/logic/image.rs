use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MODEL: &str = "dall-e-3";
const SIZE: &str = "1024x1024";
const QUALITY: &str = "standard";

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("Image request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Image API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Image API response did not contain an image URL")]
    MissingUrl,
}

/// Turns a prompt into the URL of a generated image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError>;
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// OpenAI Images API client
pub struct OpenAiImageGenerator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiImageGenerator {
    pub fn new(client: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let body = GenerationRequest {
            model: MODEL,
            prompt,
            n: 1,
            size: SIZE,
            quality: QUALITY,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerationResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or(UpstreamError::MissingUrl)
    }
}
