//! Runtime configuration
//!
//! Everything has a compiled-in default; environment variables (optionally
//! loaded from `.env`) override them.

use crate::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_WORDS_DIR: &str = "data/words";
pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_SD_API_URL: &str = "http://127.0.0.1:7860";
pub const STABLE_DIFFUSION_MODEL_ID: &str = "runwayml/stable-diffusion-v1-5";
pub const STABLE_DIFFUSION_NUM_STEPS: u32 = 40;
pub const STABLE_DIFFUSION_GUIDANCE_SCALE: f32 = 12.0;
pub const DEFAULT_IMAGE_SIZE: u32 = 512;
pub const DEFAULT_OPENAI_IMAGE_MODEL: &str = "gpt-image-1";
pub const DEFAULT_GENERATE_RATE_PER_MINUTE: u32 = 5;
pub const DEFAULT_RATE_PER_HOUR: u32 = 50;
pub const DEFAULT_MAX_CONCURRENT_GENERATIONS: usize = 1;
pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 300;

/// Backend that turns a prompt into image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProvider {
    StableDiffusion,
    OpenAi,
    Mock,
}

impl FromStr for ImageProvider {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stable-diffusion" | "stable_diffusion" | "sd" => Ok(Self::StableDiffusion),
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            other => Err(Error::Config(format!(
                "Unknown IMAGE_PROVIDER '{}'. Expected stable-diffusion, openai or mock",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_address: String,
    pub port: u16,
    pub words_dir: PathBuf,
    pub images_dir: PathBuf,
    pub image_provider: ImageProvider,
    pub sd_api_url: String,
    pub image_model: String,
    pub inference_steps: u32,
    pub guidance_scale: f32,
    pub image_width: u32,
    pub image_height: u32,
    pub openai_api_key: Option<String>,
    pub chimera_chance: f64,
    pub generate_rate_per_minute: u32,
    pub default_rate_per_hour: u32,
    pub max_concurrent_generations: usize,
    pub inference_timeout_secs: u64,
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            words_dir: PathBuf::from(DEFAULT_WORDS_DIR),
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            image_provider: ImageProvider::StableDiffusion,
            sd_api_url: DEFAULT_SD_API_URL.to_string(),
            image_model: STABLE_DIFFUSION_MODEL_ID.to_string(),
            inference_steps: STABLE_DIFFUSION_NUM_STEPS,
            guidance_scale: STABLE_DIFFUSION_GUIDANCE_SCALE,
            image_width: DEFAULT_IMAGE_SIZE,
            image_height: DEFAULT_IMAGE_SIZE,
            openai_api_key: None,
            chimera_chance: crate::prompts::CHIMERA_CHANCE,
            generate_rate_per_minute: DEFAULT_GENERATE_RATE_PER_MINUTE,
            default_rate_per_hour: DEFAULT_RATE_PER_HOUR,
            max_concurrent_generations: DEFAULT_MAX_CONCURRENT_GENERATIONS,
            inference_timeout_secs: DEFAULT_INFERENCE_TIMEOUT_SECS,
            dry_run: false,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read configuration from the environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let dry_run = parse_or("DRY_RUN", &lookup, defaults.dry_run)?;

        let image_provider = match lookup("IMAGE_PROVIDER") {
            _ if dry_run => ImageProvider::Mock,
            Some(value) => value.parse()?,
            None => defaults.image_provider,
        };

        // The SD checkpoint name makes no sense for OpenAI.
        let default_model = match image_provider {
            ImageProvider::OpenAi => DEFAULT_OPENAI_IMAGE_MODEL.to_string(),
            _ => defaults.image_model,
        };

        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        if image_provider == ImageProvider::OpenAi && openai_api_key.is_none() {
            return Err(Error::Config(
                "OPENAI_API_KEY must be set when IMAGE_PROVIDER=openai".to_string(),
            ));
        }

        let chimera_chance: f64 = parse_or("CHIMERA_CHANCE", &lookup, defaults.chimera_chance)?;
        if !(0.0..=1.0).contains(&chimera_chance) {
            return Err(Error::Config(format!(
                "CHIMERA_CHANCE must be between 0 and 1, got {}",
                chimera_chance
            )));
        }

        let max_concurrent_generations = parse_or(
            "MAX_CONCURRENT_GENERATIONS",
            &lookup,
            defaults.max_concurrent_generations,
        )?;
        if max_concurrent_generations == 0 {
            return Err(Error::Config(
                "MAX_CONCURRENT_GENERATIONS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            listen_address: lookup("LISTEN_ADDRESS").unwrap_or(defaults.listen_address),
            port: parse_or("PORT", &lookup, defaults.port)?,
            words_dir: lookup("WORDS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.words_dir),
            images_dir: lookup("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.images_dir),
            image_provider,
            sd_api_url: lookup("SD_API_URL").unwrap_or(defaults.sd_api_url),
            image_model: lookup("IMAGE_MODEL").unwrap_or(default_model),
            inference_steps: parse_or("INFERENCE_STEPS", &lookup, defaults.inference_steps)?,
            guidance_scale: parse_or("GUIDANCE_SCALE", &lookup, defaults.guidance_scale)?,
            image_width: parse_or("IMAGE_WIDTH", &lookup, defaults.image_width)?,
            image_height: parse_or("IMAGE_HEIGHT", &lookup, defaults.image_height)?,
            openai_api_key,
            chimera_chance,
            generate_rate_per_minute: parse_or(
                "GENERATE_RATE_PER_MINUTE",
                &lookup,
                defaults.generate_rate_per_minute,
            )?,
            default_rate_per_hour: parse_or(
                "DEFAULT_RATE_PER_HOUR",
                &lookup,
                defaults.default_rate_per_hour,
            )?,
            max_concurrent_generations,
            inference_timeout_secs: parse_or(
                "INFERENCE_TIMEOUT_SECS",
                &lookup,
                defaults.inference_timeout_secs,
            )?,
            dry_run,
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        _ => Ok(default),
    }
}
