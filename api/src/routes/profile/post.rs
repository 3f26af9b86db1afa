use axum::{Json, extract::State};
use services::user_service::{ChangePassword, UserService};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, Empty, ok};

/// POST /change-password/
///
/// ### Request Body
/// ```json
/// { "old_password": "...", "new_password": "...", "confirm_password": "..." }
/// ```
///
/// ### Responses
/// - `200 OK`
/// - `400 Bad Request` when the old password is wrong, the new one is too
///   short or unchanged, or the confirmation does not match
pub async fn change_password(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ChangePassword>,
) -> ApiResult<Empty> {
    UserService::change_password(app_state.db(), &user.actor(), req).await?;
    ok(Empty::default(), "Password changed successfully")
}
