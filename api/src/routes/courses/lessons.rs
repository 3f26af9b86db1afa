//! `/courses/lessons/`: standalone lesson CRUD and lesson completion.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use db::models::lesson;
use serde::Deserialize;
use serde_json::Value;
use services::content_service::ContentService;
use services::progress_service::{CompletionOutcome, ProgressService};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, Empty, created, ok};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses/lessons/", get(list_lessons).post(create_lesson))
        .route(
            "/courses/lessons/{lesson_id}/",
            get(get_lesson)
                .put(update_lesson)
                .patch(update_lesson)
                .delete(delete_lesson),
        )
        .route("/courses/lessons/{lesson_id}/complete/", post(complete_lesson))
}

#[derive(Debug, Deserialize)]
pub struct ListLessonsQuery {
    pub module_id: Option<i64>,
}

/// GET /courses/lessons/?module_id=
pub async fn list_lessons(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListLessonsQuery>,
) -> ApiResult<Vec<lesson::Model>> {
    let lessons = ContentService::list_lessons(app_state.db(), Some(&user.actor()), query.module_id).await?;
    ok(lessons, "Lessons retrieved successfully")
}

pub async fn get_lesson(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(lesson_id): Path<i64>,
) -> ApiResult<lesson::Model> {
    let lesson = ContentService::get_lesson(app_state.db(), Some(&user.actor()), lesson_id).await?;
    ok(lesson, "Lesson retrieved successfully")
}

/// POST /courses/lessons/
///
/// ### Request Body
/// ```json
/// { "module_id": 1, "title": "Variables", "content": "...", "has_quiz": true }
/// ```
pub async fn create_lesson(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(body): Json<Value>,
) -> ApiResult<lesson::Model> {
    let lesson = ContentService::create_lesson(app_state.db(), Some(&user.actor()), &body).await?;
    created(lesson, "Lesson created successfully")
}

/// PUT|PATCH /courses/lessons/{lesson_id}/
pub async fn update_lesson(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(lesson_id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<lesson::Model> {
    let lesson = ContentService::update_lesson(
        app_state.db(),
        app_state.storage(),
        Some(&user.actor()),
        lesson_id,
        &body,
    )
    .await?;
    ok(lesson, "Lesson updated successfully")
}

pub async fn delete_lesson(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(lesson_id): Path<i64>,
) -> ApiResult<Empty> {
    ContentService::delete_lesson(app_state.db(), app_state.storage(), Some(&user.actor()), lesson_id).await?;
    ok(Empty::default(), "Lesson deleted successfully")
}

/// POST /courses/lessons/{lesson_id}/complete/
///
/// Marks the lesson completed for the caller. Completing the last lesson of
/// a course issues the course certificate.
///
/// ### Responses
/// - `200 OK` with `{ "progress_updated": bool, "certificate_issued": bool }`
/// - `404 Not Found` for an unknown lesson
pub async fn complete_lesson(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(lesson_id): Path<i64>,
) -> ApiResult<CompletionOutcome> {
    let outcome = ProgressService::record_completion(app_state.db(), Some(&user.actor()), lesson_id).await?;
    let message = if outcome.certificate_issued {
        "Lesson completed, certificate issued"
    } else {
        "Lesson completed"
    };
    ok(outcome, message)
}
