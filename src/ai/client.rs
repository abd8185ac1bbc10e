use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Thin JSON-over-HTTP client shared by the remote image providers.
pub struct ProviderHttpClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    bearer_token: Option<String>,
    provider: &'static str,
}

impl ProviderHttpClient {
    pub fn new(provider: &'static str, base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: None,
            provider,
        })
    }

    pub fn with_bearer_token(mut self, token: String) -> Self {
        self.bearer_token = Some(token);
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.post(&url).json(request);
        if let Some(token) = &self.bearer_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send request to {}: {}", self.provider, e);
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!(
                "{} API error (status {}): {}",
                self.provider,
                status,
                error_text
            );
            return Err(Error::AiProvider(format!(
                "{} API error (status {}): {}",
                self.provider, status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", self.provider, e);
            Error::AiProvider(format!("Failed to parse {} response: {}", self.provider, e))
        })
    }

    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Decode a base64 image payload returned by a provider.
pub fn decode_base64_image(payload: &str) -> Result<Vec<u8>> {
    use base64::Engine as _;

    // Some servers prefix a data URL header.
    let data = payload
        .split_once(";base64,")
        .map(|(_, data)| data)
        .unwrap_or(payload);

    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| Error::AiProvider(format!("Failed to decode base64 image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    #[test]
    fn test_decode_plain_base64() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        assert_eq!(decode_base64_image(&encoded).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_data_url() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([9u8, 8]);
        let data_url = format!("data:image/png;base64,{}", encoded);
        assert_eq!(decode_base64_image(&data_url).unwrap(), vec![9, 8]);
    }

    #[test]
    fn test_decode_invalid() {
        let err = decode_base64_image("!!not base64!!").unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ProviderHttpClient::new(
            "Test",
            "http://localhost:7860/".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:7860");
    }
}
