//! Image generation backends
//!
//! The model runtime is treated as an opaque `prompt -> image bytes` call
//! behind [`ImageGenerationService`]. Stable Diffusion (via its txt2img web
//! API) is the default; OpenAI and an in-process mock are alternatives.

pub mod client;
pub mod mime;
pub mod mock;
pub mod openai;
pub mod stable_diffusion;

pub use client::ProviderHttpClient;
pub use mock::MockImageGenerationClient;
pub use openai::OpenAiImageClient;
pub use stable_diffusion::{StableDiffusionClient, StableDiffusionSettings};

use crate::config::{Config, ImageProvider};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>>;
}

/// Build the provider selected by `config`.
pub fn build_image_service(config: &Config) -> Result<Box<dyn ImageGenerationService>> {
    let timeout = Duration::from_secs(config.inference_timeout_secs);

    match config.image_provider {
        ImageProvider::StableDiffusion => {
            info!(
                "Image provider: Stable Diffusion at {} (model: {})",
                config.sd_api_url, config.image_model
            );
            let settings = StableDiffusionSettings {
                model: config.image_model.clone(),
                steps: config.inference_steps,
                guidance_scale: config.guidance_scale,
                width: config.image_width,
                height: config.image_height,
            };
            Ok(Box::new(StableDiffusionClient::new(
                config.sd_api_url.clone(),
                settings,
                timeout,
            )?))
        }
        ImageProvider::OpenAi => {
            info!("Image provider: OpenAI (model: {})", config.image_model);
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                Error::Config("OPENAI_API_KEY must be set when IMAGE_PROVIDER=openai".to_string())
            })?;
            Ok(Box::new(OpenAiImageClient::new(
                api_key,
                config.image_model.clone(),
                format!("{}x{}", config.image_width, config.image_height),
                timeout,
            )?))
        }
        ImageProvider::Mock => {
            info!("Image provider: mock (no inference will run)");
            Ok(Box::new(MockImageGenerationClient::new()))
        }
    }
}
