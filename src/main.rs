use anyhow::Result;
use chimera_generator::config::Config;
use chimera_generator::limiter::RateLimiter;
use chimera_generator::service::Generator;
use chimera_generator::web::{setup_server, AppState};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "chimera-generator")]
#[command(about = "Serve randomly titled chimera images generated on demand")]
struct CliArgs {
    /// Address to listen on (overrides LISTEN_ADDRESS).
    #[arg(long, short)]
    listen_address: Option<String>,

    /// Port to listen on (overrides PORT).
    #[arg(long, short, value_parser = parse_port_arg)]
    port: Option<u16>,

    /// Use the mock image provider instead of running inference.
    #[arg(long)]
    dry_run: bool,
}

fn parse_port_arg(input: &str) -> std::result::Result<u16, String> {
    match input.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!(
            "Invalid port '{}'. Expected a number between 1 and 65535",
            input
        )),
        Ok(port) => Ok(port),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chimera_generator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting chimera-generator");

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(listen_address) = args.listen_address {
        config.listen_address = listen_address;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.dry_run {
        config.dry_run = true;
        config.image_provider = chimera_generator::config::ImageProvider::Mock;
    }

    let generator = match Generator::from_config(&config) {
        Ok(generator) => generator,
        Err(e) => {
            error!("Failed to initialize generator: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(
        generator,
        RateLimiter::per_minute(config.generate_rate_per_minute),
        RateLimiter::per_hour(config.default_rate_per_hour),
    );

    setup_server(&config.listen_address, config.port, state, shutdown_signal()).await
}
