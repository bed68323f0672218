//! Login throttle middleware.
//!
//! Applied to the login route only, ahead of the handler, so throttled
//! clients are rejected before any credential verification runs.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::api::AppState;
use crate::errors::AppError;
use crate::services::ThrottleDecision;

/// Extract client identifier for rate limiting.
/// Uses X-Forwarded-For header if behind proxy, otherwise uses connection IP.
fn get_client_identifier(request: &Request) -> String {
    // Try X-Forwarded-For header first (for reverse proxies)
    if let Some(forwarded) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        // Take the first IP in the chain (original client)
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    // Try X-Real-IP header
    if let Some(real_ip) = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
    {
        return real_ip.to_string();
    }

    // Fall back to connection info
    if let Some(connect_info) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return connect_info.0.ip().to_string();
    }

    // Last resort: unknown
    "unknown".to_string()
}

/// Throttle login attempts per client key.
///
/// Counter-store failures surface as infrastructure errors rather than
/// throttle rejections, so operational faults stay visible. Either way the
/// request does not reach the verifier.
pub async fn login_throttle_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client_id = get_client_identifier(&request);

    let remaining = match state.throttle.check_and_record(&client_id).await? {
        ThrottleDecision::Throttled { retry_after } => {
            return Err(AppError::Throttled { retry_after });
        }
        ThrottleDecision::Allowed { remaining } => remaining,
    };

    let mut response = next.run(request).await;

    // Advertise the remaining attempts to the client
    response.headers_mut().insert(
        "X-RateLimit-Limit",
        HeaderValue::from_str(&state.throttle.limit().to_string()).unwrap(),
    );
    response.headers_mut().insert(
        "X-RateLimit-Remaining",
        HeaderValue::from_str(&remaining.to_string()).unwrap(),
    );

    Ok(response)
}
