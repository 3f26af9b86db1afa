use axum::extract::{Path, Request, State};
use services::course_service::CourseService;
use services::views::CourseView;
use util::state::AppState;

use super::common::read_course_write;
use crate::auth::AuthUser;
use crate::response::{ApiResult, ok};

/// PUT /courses/{course_id}/
///
/// Full update. `title` and `code` are required, and the submitted `modules`
/// tree replaces the stored one: nodes with a known `id` are updated, nodes
/// without one are created, and stored nodes missing from the request are
/// deleted. Omitting `modules` empties the course.
pub async fn replace_course(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
    req: Request,
) -> ApiResult<CourseView> {
    let write = read_course_write(&app_state, req).await?;
    let course = CourseService::update(
        app_state.db(),
        app_state.storage(),
        Some(&user.actor()),
        course_id,
        write,
        false,
    )
    .await?;
    ok(course, "Course updated successfully")
}

/// PATCH /courses/{course_id}/
///
/// Partial update. Only the given fields change; the tree is reconciled only
/// when `modules` is present.
pub async fn patch_course(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
    req: Request,
) -> ApiResult<CourseView> {
    let write = read_course_write(&app_state, req).await?;
    let course = CourseService::update(
        app_state.db(),
        app_state.storage(),
        Some(&user.actor()),
        course_id,
        write,
        true,
    )
    .await?;
    ok(course, "Course updated successfully")
}
