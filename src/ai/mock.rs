use super::ImageGenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Smallest valid PNG: 1x1 RGB pixel.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Clone)]
pub struct MockImageGenerationClient {
    image_responses: Arc<Mutex<Vec<Vec<u8>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
    delay: Duration,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            image_responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
            delay: Duration::ZERO,
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.image_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    /// Sleep this long inside every call, to simulate slow inference.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let call = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.prompts.lock().unwrap().push(prompt.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if *self.should_fail.lock().unwrap() {
            return Err(Error::AiProvider("Mock inference failure".to_string()));
        }

        let responses = self.image_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(TINY_PNG.to_vec())
        } else {
            let index = (call - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_png_by_default() {
        let client = MockImageGenerationClient::new();
        let image = client.generate_image("a fox").await.unwrap();
        assert_eq!(&image[..4], &[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(image, TINY_PNG);
    }

    #[tokio::test]
    async fn test_mock_cycles_custom_responses() {
        let client = MockImageGenerationClient::new()
            .with_image_response(vec![1])
            .with_image_response(vec![2]);

        assert_eq!(client.generate_image("a").await.unwrap(), vec![1]);
        assert_eq!(client.generate_image("b").await.unwrap(), vec![2]);
        assert_eq!(client.generate_image("c").await.unwrap(), vec![1]);
        assert_eq!(client.get_call_count(), 3);
        assert_eq!(client.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let client = MockImageGenerationClient::new().with_failure(true);
        let err = client.generate_image("a fox").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
        assert_eq!(client.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_counters() {
        let client = MockImageGenerationClient::new();
        let probe = client.clone();
        client.generate_image("a fox").await.unwrap();
        assert_eq!(probe.get_call_count(), 1);
    }
}
