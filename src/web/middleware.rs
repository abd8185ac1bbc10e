use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::error::ApiError;
use super::AppState;
use crate::limiter::{Decision, RateLimiter};

fn enforce(limiter: &RateLimiter, addr: SocketAddr, path: &str) -> Result<(), ApiError> {
    match limiter.check(&addr.ip()) {
        Decision::Allowed => Ok(()),
        Decision::Limited { retry_after } => {
            warn!("Throttling {} on {} ({})", addr.ip(), path, limiter.describe());
            Err(ApiError::RateLimited {
                limit: limiter.describe(),
                retry_after,
            })
        }
    }
}

/// Per-client limit for the generation trigger.
pub(crate) async fn generate_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    match enforce(&state.generate_limiter, addr, request.uri().path()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}

/// Per-client limit shared by every other limited route.
pub(crate) async fn default_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    match enforce(&state.default_limiter, addr, request.uri().path()) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
