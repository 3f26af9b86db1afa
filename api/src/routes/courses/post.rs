use axum::{
    Json,
    extract::{Path, Request, State},
};
use services::course_service::CourseService;
use services::views::CourseView;
use util::state::AppState;

use super::common::{RejectRequest, read_course_write};
use crate::auth::AuthUser;
use crate::response::{ApiResult, Empty, created, ok};

/// POST /courses/
///
/// Creates a course with its nested tree. Instructors only; the caller
/// becomes creator and instructor.
///
/// ### Request Body (JSON or multipart)
/// ```json
/// {
///   "title": "Algebra I",
///   "code": "MATH101",
///   "description": "Linear equations and more",
///   "category": "maths",
///   "modules": [
///     { "title": "Basics", "lessons": [
///       { "title": "Variables", "activities": [
///         { "title": "Quiz 1", "activity_type": "quiz", "due_date": "2025-09-01T12:00:00Z" }
///       ] }
///     ] }
///   ]
/// }
/// ```
///
/// ### Responses
/// - `201 Created` with the course view
/// - `400 Bad Request` with the path of the offending node, e.g. `modules[0].lessons[1]: Title is required`
/// - `403 Forbidden` for non-instructors
/// - `409 Conflict` on a duplicate course code
pub async fn create_course(
    State(app_state): State<AppState>,
    user: AuthUser,
    req: Request,
) -> ApiResult<CourseView> {
    let write = read_course_write(&app_state, req).await?;
    let course = CourseService::create(app_state.db(), Some(&user.actor()), write).await?;
    created(course, "Course created successfully")
}

/// POST /courses/{course_id}/submit/
///
/// Sends a draft or rejected course for admin review.
pub async fn submit_course(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> ApiResult<CourseView> {
    let course = CourseService::submit_for_review(app_state.db(), Some(&user.actor()), course_id).await?;
    ok(course, "Course submitted for review")
}

/// POST /courses/{course_id}/approve/
///
/// Admin only.
pub async fn approve_course(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> ApiResult<CourseView> {
    let course = CourseService::approve(app_state.db(), Some(&user.actor()), course_id).await?;
    ok(course, "Course approved")
}

/// POST /courses/{course_id}/reject/
///
/// Admin only. Body: `{ "feedback": "..." }`, feedback is required.
pub async fn reject_course(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
    Json(req): Json<RejectRequest>,
) -> ApiResult<CourseView> {
    let course = CourseService::reject(app_state.db(), Some(&user.actor()), course_id, &req.feedback).await?;
    ok(course, "Course rejected")
}

/// POST /courses/{course_id}/enroll/
///
/// Enrolls the calling student into an approved course.
///
/// ### Responses
/// - `200 OK`
/// - `403 Forbidden` for non-students
/// - `404 Not Found` for unknown or unapproved courses
/// - `409 Conflict` when already enrolled
pub async fn enroll(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> ApiResult<Empty> {
    CourseService::enroll(app_state.db(), Some(&user.actor()), course_id).await?;
    ok(Empty::default(), "Enrolled successfully")
}
