use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the dashboard API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// API key middleware - when a key is configured, the request must present it
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = state.config.api_key.as_deref() {
        let presented = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        if presented != Some(expected) {
            tracing::warn!(path = %request.uri().path(), "Rejected request with missing or wrong API key");
            return Err(AppError::Forbidden);
        }
    }

    Ok(next.run(request).await)
}

/// IP allow list middleware - when networks are configured, the peer must be in one of them
pub async fn ip_allow_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.allowed_networks.is_empty() {
        // Peer address is only known when served with connect info
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        match peer {
            Some(ip) if state.config.is_ip_allowed(ip) => {}
            _ => {
                tracing::warn!(peer = ?peer, "Rejected request from address outside the allow list");
                return Err(AppError::Forbidden);
            }
        }
    }

    Ok(next.run(request).await)
}
