//! User handlers.

use axum::{response::Json, routing::get, Extension, Router};

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::UserResponse;
use crate::errors::AppResult;

/// Create user routes (all require authentication)
pub fn user_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_current_user))
}

/// Get the currently authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Inactive user account")
    )
)]
pub async fn get_current_user(
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(UserResponse::from(user.0)))
}
