//! `/courses/activities/`: standalone activity CRUD.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use db::models::activity;
use serde::Deserialize;
use serde_json::Value;
use services::content_service::ContentService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, Empty, created, ok};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses/activities/", get(list_activities).post(create_activity))
        .route(
            "/courses/activities/{activity_id}/",
            get(get_activity)
                .put(update_activity)
                .patch(update_activity)
                .delete(delete_activity),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListActivitiesQuery {
    pub lesson_id: Option<i64>,
}

pub async fn list_activities(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListActivitiesQuery>,
) -> ApiResult<Vec<activity::Model>> {
    let activities = ContentService::list_activities(app_state.db(), Some(&user.actor()), query.lesson_id).await?;
    ok(activities, "Activities retrieved successfully")
}

pub async fn get_activity(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(activity_id): Path<i64>,
) -> ApiResult<activity::Model> {
    let activity = ContentService::get_activity(app_state.db(), Some(&user.actor()), activity_id).await?;
    ok(activity, "Activity retrieved successfully")
}

/// POST /courses/activities/
///
/// ### Request Body
/// ```json
/// { "lesson_id": 1, "title": "Quiz 1", "activity_type": "quiz", "max_score": 10, "due_date": null }
/// ```
pub async fn create_activity(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(body): Json<Value>,
) -> ApiResult<activity::Model> {
    let activity = ContentService::create_activity(app_state.db(), Some(&user.actor()), &body).await?;
    created(activity, "Activity created successfully")
}

pub async fn update_activity(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(activity_id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<activity::Model> {
    let activity = ContentService::update_activity(app_state.db(), Some(&user.actor()), activity_id, &body).await?;
    ok(activity, "Activity updated successfully")
}

/// DELETE /courses/activities/{activity_id}/
///
/// Removes the activity together with its submissions and their files.
pub async fn delete_activity(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(activity_id): Path<i64>,
) -> ApiResult<Empty> {
    ContentService::delete_activity(app_state.db(), app_state.storage(), Some(&user.actor()), activity_id).await?;
    ok(Empty::default(), "Activity deleted successfully")
}
