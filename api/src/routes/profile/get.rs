use axum::extract::State;
use services::user_service::UserService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, ok};
use crate::routes::users::common::UserResponse;

/// GET /profile/
pub async fn get_profile(State(app_state): State<AppState>, user: AuthUser) -> ApiResult<UserResponse> {
    let model = UserService::get(app_state.db(), user.0.sub).await?;
    ok(model.into(), "Profile retrieved successfully")
}
