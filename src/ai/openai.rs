use super::client::{decode_base64_image, ProviderHttpClient};
use super::ImageGenerationService;
use crate::models::{ImageGenerationRequest, ImageGenerationResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiImageClient {
    http: ProviderHttpClient,
    model: String,
    size: String,
}

impl OpenAiImageClient {
    pub fn new(api_key: String, model: String, size: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: ProviderHttpClient::new("OpenAI", DEFAULT_BASE_URL.to_string(), timeout)?
                .with_bearer_token(api_key),
            model,
            size,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.size.clone(),
        };

        let response: ImageGenerationResponse =
            self.http.post("/v1/images/generations", &request).await?;

        let image_data = response
            .data
            .first()
            .ok_or_else(|| Error::AiProvider("No image data in OpenAI response".to_string()))?;

        if let Some(b64_json) = &image_data.b64_json {
            decode_base64_image(b64_json)
        } else if let Some(url) = &image_data.url {
            self.http.download(url).await
        } else {
            Err(Error::AiProvider(
                "No image data (neither base64 nor URL) in response".to_string(),
            ))
        }
    }
}
