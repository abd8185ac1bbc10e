//! HTTP front end
//!
//! `GET /generate` runs one generation and returns its metadata;
//! `GET /images/{filename}` serves the stored bytes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{middleware as axum_middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::ai::mime;
use crate::limiter::RateLimiter;
use crate::models::GenerateResponse;
use crate::service::Generator;

mod error;
mod middleware;

pub use error::ApiError;
use middleware::{default_rate_limit, generate_rate_limit};

#[derive(Clone)]
pub struct AppState {
    generator: Arc<Generator>,
    generate_limiter: Arc<RateLimiter>,
    default_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        generator: Generator,
        generate_limiter: RateLimiter,
        default_limiter: RateLimiter,
    ) -> Self {
        Self {
            generator: Arc::new(generator),
            generate_limiter: Arc::new(generate_limiter),
            default_limiter: Arc::new(default_limiter),
        }
    }
}

async fn generate_handler(
    State(state): State<AppState>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let generation = state.generator.generate().await?;
    info!(
        "Generated '{}' -> {}",
        generation.title,
        generation.image_path()
    );
    Ok(Json(GenerateResponse::from(generation)))
}

async fn image_handler(
    State(state): State<AppState>,
    filename: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    // A name that does not decode to UTF-8 cannot exist in the store.
    let Path(filename) =
        filename.map_err(|rejection| ApiError::NotFound(rejection.body_text()))?;
    let bytes = state
        .generator
        .fetch_image(&filename)
        .await?
        .ok_or_else(|| ApiError::NotFound(filename.clone()))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, mime::content_type_for(&bytes))
        .body(Body::from(bytes))
        .map_err(|e| ApiError::Generation(crate::Error::Invariant(e.to_string())))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "words_loaded": state.generator.has_words(),
        "available_slots": state.generator.available_slots(),
    }))
}

/// Build the router with rate limits and request tracing applied.
pub fn create_router(state: AppState) -> Router {
    let generate = Router::new()
        .route("/generate", get(generate_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            generate_rate_limit,
        ));

    let images = Router::new()
        .route("/images/{filename}", get(image_handler))
        .route_layer(CorsLayer::new().allow_origin(Any));

    let limited = Router::new()
        .route("/health", get(health_handler))
        .merge(images)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            default_rate_limit,
        ));

    Router::new()
        .merge(generate)
        .merge(limited)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn setup_server(
    listen_addr: &str,
    port: u16,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), anyhow::Error> {
    let app = create_router(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    {
        error!("Server error: {}", err);
        return Err(err.into());
    }
    info!("Server stopped");
    Ok(())
}
