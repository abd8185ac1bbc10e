use super::client::{decode_base64_image, ProviderHttpClient};
use super::ImageGenerationService;
use crate::config::{
    DEFAULT_IMAGE_SIZE, STABLE_DIFFUSION_GUIDANCE_SCALE, STABLE_DIFFUSION_MODEL_ID,
    STABLE_DIFFUSION_NUM_STEPS,
};
use crate::models::{Txt2ImgOverrides, Txt2ImgRequest, Txt2ImgResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Sampling parameters sent with every txt2img call.
#[derive(Debug, Clone, PartialEq)]
pub struct StableDiffusionSettings {
    pub model: String,
    pub steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
}

impl Default for StableDiffusionSettings {
    fn default() -> Self {
        Self {
            model: STABLE_DIFFUSION_MODEL_ID.to_string(),
            steps: STABLE_DIFFUSION_NUM_STEPS,
            guidance_scale: STABLE_DIFFUSION_GUIDANCE_SCALE,
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
        }
    }
}

/// Client for a Stable Diffusion server exposing `/sdapi/v1/txt2img`.
pub struct StableDiffusionClient {
    http: ProviderHttpClient,
    settings: StableDiffusionSettings,
}

impl StableDiffusionClient {
    pub fn new(
        base_url: String,
        settings: StableDiffusionSettings,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: ProviderHttpClient::new("Stable Diffusion", base_url, timeout)?,
            settings,
        })
    }
}

#[async_trait]
impl ImageGenerationService for StableDiffusionClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let request = Txt2ImgRequest {
            prompt: prompt.to_string(),
            steps: self.settings.steps,
            cfg_scale: self.settings.guidance_scale,
            width: self.settings.width,
            height: self.settings.height,
            override_settings: Txt2ImgOverrides {
                sd_model_checkpoint: self.settings.model.clone(),
            },
        };

        tracing::debug!(
            "Running txt2img ({} steps, guidance {})",
            request.steps,
            request.cfg_scale
        );
        let response: Txt2ImgResponse = self.http.post("/sdapi/v1/txt2img", &request).await?;

        let image = response.images.first().ok_or_else(|| {
            Error::AiProvider("No images in Stable Diffusion response".to_string())
        })?;

        decode_base64_image(image)
    }
}
