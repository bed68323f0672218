//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::User;
use crate::errors::AppError;

/// Authenticated user resolved from the bearer token.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// JWT authentication middleware.
///
/// Extracts the bearer token from the Authorization header, resolves the
/// user through the auth service's shared token path, and injects the
/// CurrentUser into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .ok_or(AppError::Unauthorized)?;

    let user = state.auth_service.user_from_token(token).await?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
