use axum::{Json, extract::State};
use db::models::user::Role;
use services::user_service::{RegisterUser, UserService};
use util::state::AppState;

use super::common::UserResponse;
use crate::response::{ApiResult, created};

/// POST /users/
///
/// Registers a new student account. The username is derived from the email
/// and names are title-cased.
///
/// ### Request Body
/// ```json
/// {
///   "email": "ada@example.com",
///   "first_name": "ada",
///   "last_name": "lovelace",
///   "student_number": "u12345678",
///   "password": "correct-horse",
///   "confirm_password": "correct-horse"
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the new user
/// - `400 Bad Request` on validation failure or mismatched passwords
/// - `409 Conflict` when the email or student number is taken
pub async fn register(State(app_state): State<AppState>, Json(req): Json<RegisterUser>) -> ApiResult<UserResponse> {
    let user = UserService::register(app_state.db(), req, Role::Student).await?;
    created(user.into(), "User registered successfully")
}
