use axum::extract::{Request, State};
use services::user_service::{ProfileUpdate, UserService};
use util::{paths::PROFILE_PICTURES_DIR, state::AppState};

use crate::auth::AuthUser;
use crate::response::{ApiResult, ok};
use crate::routes::common::{FormBody, Upload};
use crate::routes::users::common::UserResponse;

const PICTURE_UPLOAD: Upload = Upload {
    field: "profile_picture",
    dir: PROFILE_PICTURES_DIR,
    images_only: true,
    max_bytes: 2 * 1024 * 1024,
};

/// PUT /profile/
///
/// Updates names, student number, password and picture of the caller. Every
/// field is optional. Accepts JSON or `multipart/form-data`.
///
/// ### Fields
/// - `first_name`, `last_name`, `student_number`
/// - `new_password` + `confirm_password`
/// - `profile_picture` (file, images up to 2 MB)
/// - `remove_picture` (flag): reset to the default avatar
///
/// ### Responses
/// - `200 OK` with the updated user
/// - `400 Bad Request` on invalid fields
/// - `409 Conflict` when the student number is taken
pub async fn update_profile(
    State(app_state): State<AppState>,
    user: AuthUser,
    req: Request,
) -> ApiResult<UserResponse> {
    let mut body = FormBody::read(req, app_state.storage(), &[PICTURE_UPLOAD]).await?;

    let update = ProfileUpdate {
        first_name: body.text("first_name"),
        last_name: body.text("last_name"),
        student_number: body.text("student_number"),
        new_password: body.text("new_password").filter(|p| !p.is_empty()),
        confirm_password: body.text("confirm_password").filter(|p| !p.is_empty()),
        picture: body.file_change("profile_picture", "remove_picture"),
    };

    let model = UserService::update_profile(app_state.db(), app_state.storage(), &user.actor(), update).await?;
    ok(model.into(), "Profile updated successfully")
}
