use axum::extract::State;
use services::user_service::UserService;
use util::state::AppState;

use super::common::UserResponse;
use crate::response::{ApiResult, ok};

/// GET /users/
///
/// Every user ordered by id. Admin only.
pub async fn list_users(State(app_state): State<AppState>) -> ApiResult<Vec<UserResponse>> {
    let users = UserService::list(app_state.db()).await?;
    ok(
        users.into_iter().map(UserResponse::from).collect(),
        "Users retrieved successfully",
    )
}
