use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use services::user_service::UserService;
use util::state::AppState;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::{ApiError, ApiResult, ok};
use crate::routes::users::common::UserResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: String,
    pub user: UserResponse,
}

/// POST /auth/login
///
/// Authenticates by email and password and issues a JWT.
///
/// ### Request Body
/// ```json
/// { "email": "ada@example.com", "password": "correct-horse" }
/// ```
///
/// ### Responses
/// - `200 OK` with `{ token, expires_at, user }`
/// - `400 Bad Request` on validation failure
/// - `401 Unauthorized` on unknown email, wrong password, or inactive account
pub async fn login(State(app_state): State<AppState>, Json(req): Json<LoginRequest>) -> ApiResult<LoginResponse> {
    if let Err(e) = req.validate() {
        return Err(ApiError::bad_request(common::format_validation_errors(&e)));
    }

    let Some(user) = UserService::verify_credentials(app_state.db(), &req.email, &req.password).await? else {
        tracing::info!(email = %req.email, "Rejected login");
        return Err(ApiError::unauthorized("Invalid email or password"));
    };

    let (token, expires_at) = generate_jwt(user.id, user.role).map_err(|e| {
        tracing::error!(error = %e, "Token encoding failed");
        ApiError::new(axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })?;

    tracing::info!(user_id = user.id, "User logged in");
    ok(
        LoginResponse {
            token,
            expires_at,
            user: user.into(),
        },
        "Login successful",
    )
}
