use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// IP-keyed rate limiting layer
pub type GlobalGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// One token every `rate_limit_per_ms` milliseconds per client IP, bursting
/// up to `rate_limit_burst`. Applied before authentication.
pub fn create_global_governor(config: &Config) -> AppResult<GlobalGovernorLayer> {
    let governor_config = GovernorConfigBuilder::default()
        .per_millisecond(config.rate_limit_per_ms)
        .burst_size(config.rate_limit_burst)
        .finish()
        .ok_or_else(|| AppError::Internal("Invalid rate limit configuration".to_string()))?;

    Ok(GovernorLayer::new(Arc::new(governor_config)))
}

/// Log every request with its outcome and latency
pub async fn log_request(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(client_ip = %addr.ip(), %method, %uri, %status, elapsed_ms, "Request failed");
    } else if status.is_client_error() {
        tracing::warn!(client_ip = %addr.ip(), %method, %uri, %status, elapsed_ms, "Request rejected");
    } else {
        tracing::debug!(client_ip = %addr.ip(), %method, %uri, %status, elapsed_ms, "Request completed");
    }

    response
}
