//! Data models and structures
//!
//! Defines the generated prompt, the JSON bodies served over HTTP, and the
//! request/response shapes of the image providers.

use serde::{Deserialize, Serialize};

/// Title and prompt produced for a single generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPrompt {
    pub title: String,
    pub prompt: String,
}

/// A finished generation: the prompt it came from and the stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub title: String,
    pub prompt: String,
    pub filename: String,
}

impl Generation {
    /// Relative URL under which the image is served.
    pub fn image_path(&self) -> String {
        format!("/images/{}", self.filename)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub title: String,
    pub prompt: String,
    pub image: String,
}

impl From<Generation> for GenerateResponse {
    fn from(generation: Generation) -> Self {
        Self {
            image: generation.image_path(),
            title: generation.title,
            prompt: generation.prompt,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

// Stable Diffusion web API (txt2img) models
#[derive(Debug, Serialize)]
pub struct Txt2ImgRequest {
    pub prompt: String,
    pub steps: u32,
    pub cfg_scale: f32,
    pub width: u32,
    pub height: u32,
    pub override_settings: Txt2ImgOverrides,
}

#[derive(Debug, Serialize)]
pub struct Txt2ImgOverrides {
    pub sd_model_checkpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct Txt2ImgResponse {
    pub images: Vec<String>,
}

// OpenAI image API models
#[derive(Debug, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageGenerationResponse {
    pub data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
pub struct ImageData {
    pub url: Option<String>,
    pub b64_json: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_response_from_generation() {
        let generation = Generation {
            title: "Ancient Lynx of Embers".to_string(),
            prompt: "Oil painting of a lynx".to_string(),
            filename: "image_1700000000000_deadbeef.png".to_string(),
        };

        let response = GenerateResponse::from(generation);
        assert_eq!(response.image, "/images/image_1700000000000_deadbeef.png");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["title"], "Ancient Lynx of Embers");
        assert_eq!(json["prompt"], "Oil painting of a lynx");
        assert_eq!(json["image"], "/images/image_1700000000000_deadbeef.png");
    }

    #[test]
    fn test_error_body_serialization() {
        let json = serde_json::to_string(&ErrorBody::new("Image not found")).unwrap();
        assert_eq!(json, r#"{"error":"Image not found"}"#);
    }

    #[test]
    fn test_txt2img_request_shape() {
        let request = Txt2ImgRequest {
            prompt: "a fox".to_string(),
            steps: 40,
            cfg_scale: 12.0,
            width: 512,
            height: 512,
            override_settings: Txt2ImgOverrides {
                sd_model_checkpoint: "runwayml/stable-diffusion-v1-5".to_string(),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["steps"], 40);
        assert_eq!(json["cfg_scale"], 12.0);
        assert_eq!(
            json["override_settings"]["sd_model_checkpoint"],
            "runwayml/stable-diffusion-v1-5"
        );
    }
}
