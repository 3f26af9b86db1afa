use axum::extract::{Path, State};
use services::course_service::CourseService;
use services::views::CourseView;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, ok};

/// GET /courses/
///
/// Courses visible to the caller: admins see all, instructors the courses they
/// created, students approved courses. Each course carries its full
/// module, lesson and activity tree.
pub async fn list_courses(State(app_state): State<AppState>, user: AuthUser) -> ApiResult<Vec<CourseView>> {
    let courses = CourseService::list(app_state.db(), Some(&user.actor())).await?;
    ok(courses, "Courses retrieved successfully")
}

/// GET /courses/{course_id}/
///
/// ### Responses
/// - `200 OK` with the course view
/// - `404 Not Found` when the course does not exist or is outside the caller's scope
pub async fn get_course(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> ApiResult<CourseView> {
    let course = CourseService::get(app_state.db(), Some(&user.actor()), course_id).await?;
    ok(course, "Course retrieved successfully")
}
