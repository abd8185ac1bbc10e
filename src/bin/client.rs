//! Command-line client for a running chimera-generator server.
//!
//! Triggers one generation, logs the title and prompt, then downloads the
//! image the server returned and writes it to disk.

use anyhow::Result as AnyResult;
use chimera_generator::models::{ErrorBody, GenerateResponse};
use chimera_generator::{Error, Result};
use clap::Parser;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Parser)]
#[command(name = "client")]
#[command(about = "Request a chimera from the server and save the image")]
struct CliArgs {
    /// Base URL of the generation server.
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    server_url: String,

    /// Where to write the image. Defaults to the server's file name in the
    /// current directory.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Request timeout in seconds; generation can take minutes.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

impl CliArgs {
    fn parse_for_app() -> Result<Self> {
        Self::try_parse().map_err(|e| Error::Config(e.to_string()))
    }

    #[cfg(test)]
    fn parse_from_for_test<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collected: Vec<String> = args.into_iter().map(Into::into).collect();
        Self::try_parse_from(collected).map_err(|e| Error::Config(e.to_string()))
    }

    fn output_path(&self, image_path: &str) -> Result<PathBuf> {
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }
        Path::new(image_path)
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| Error::Invariant(format!("No file name in '{}'", image_path)))
    }
}

/// Turn a non-success reply into `Error::Server`, preferring the JSON
/// `error` message when the body has one.
async fn error_for_status(response: Response) -> Error {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Error::Server { status, message }
}

async fn request_generation(client: &Client, server_url: &str) -> Result<GenerateResponse> {
    let response = client.get(format!("{}/generate", server_url)).send().await?;
    if !response.status().is_success() {
        return Err(error_for_status(response).await);
    }

    let status = response.status().as_u16();
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        error!("Server did not return valid JSON: {}", text);
        Error::Server {
            status,
            message: format!("Invalid JSON in reply: {}", e),
        }
    })
}

async fn fetch_image(client: &Client, server_url: &str, image_path: &str) -> Result<Vec<u8>> {
    let response = client
        .get(format!("{}{}", server_url, image_path))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(error_for_status(response).await);
    }
    Ok(response.bytes().await?.to_vec())
}

async fn run_with_client(args: &CliArgs, client: &Client) -> Result<PathBuf> {
    let server_url = args.server_url.trim_end_matches('/');

    let generation = request_generation(client, server_url).await?;
    info!("Title: {}", generation.title);
    info!("Prompt: {}", generation.prompt);

    let bytes = fetch_image(client, server_url, &generation.image).await?;
    let output = args.output_path(&generation.image)?;
    tokio::fs::write(&output, &bytes).await?;
    info!("Saved {} bytes to {}", bytes.len(), output.display());

    Ok(output)
}

async fn run() -> Result<()> {
    let args = CliArgs::parse_for_app()?;
    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;
    run_with_client(&args, &client).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}
