use axum::extract::{Path, State};
use services::user_service::UserService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, Empty, ok};

/// DELETE /users/{user_id}/
///
/// Deletes the user with everything that belongs to them, including their
/// profile picture, submission files and created courses.
///
/// ### Responses
/// - `200 OK`
/// - `403 Forbidden` when a non-admin deletes someone else
/// - `404 Not Found`
pub async fn delete_user(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<i64>,
) -> ApiResult<Empty> {
    UserService::delete(app_state.db(), app_state.storage(), &user.actor(), user_id).await?;
    ok(Empty::default(), "User deleted successfully")
}
