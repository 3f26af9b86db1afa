use axum::extract::{Path, State};
use services::course_service::CourseService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, Empty, ok};

/// DELETE /courses/{course_id}/
///
/// Deletes the course with its tree, submissions, progress and certificates.
/// Stored files (thumbnail, submission files) are removed afterwards.
pub async fn delete_course(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> ApiResult<Empty> {
    CourseService::delete(app_state.db(), app_state.storage(), Some(&user.actor()), course_id).await?;
    ok(Empty::default(), "Course deleted successfully")
}
