//! `/courses/modules/`: standalone module CRUD.
//!
//! A body carrying `lessons` also reconciles the module's lessons, the same
//! way a course update reconciles its tree.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use db::models::course_module;
use serde::Deserialize;
use serde_json::Value;
use services::content_service::ContentService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, Empty, created, ok};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses/modules/", get(list_modules).post(create_module))
        .route(
            "/courses/modules/{module_id}/",
            get(get_module)
                .put(update_module)
                .patch(update_module)
                .delete(delete_module),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListModulesQuery {
    pub course_id: Option<i64>,
}

/// GET /courses/modules/?course_id=
pub async fn list_modules(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListModulesQuery>,
) -> ApiResult<Vec<course_module::Model>> {
    let modules = ContentService::list_modules(app_state.db(), Some(&user.actor()), query.course_id).await?;
    ok(modules, "Modules retrieved successfully")
}

pub async fn get_module(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(module_id): Path<i64>,
) -> ApiResult<course_module::Model> {
    let module = ContentService::get_module(app_state.db(), Some(&user.actor()), module_id).await?;
    ok(module, "Module retrieved successfully")
}

/// POST /courses/modules/
///
/// ### Request Body
/// ```json
/// { "course_id": 1, "title": "Basics", "order": 0, "lessons": [{ "title": "Variables" }] }
/// ```
pub async fn create_module(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(body): Json<Value>,
) -> ApiResult<course_module::Model> {
    let module = ContentService::create_module(app_state.db(), Some(&user.actor()), &body).await?;
    created(module, "Module created successfully")
}

/// PUT|PATCH /courses/modules/{module_id}/
///
/// Only the given fields change. `course_id`, if sent, must match the current course.
pub async fn update_module(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(module_id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<course_module::Model> {
    let module = ContentService::update_module(
        app_state.db(),
        app_state.storage(),
        Some(&user.actor()),
        module_id,
        &body,
    )
    .await?;
    ok(module, "Module updated successfully")
}

/// DELETE /courses/modules/{module_id}/
///
/// Deletes the module with its lessons and activities.
pub async fn delete_module(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(module_id): Path<i64>,
) -> ApiResult<Empty> {
    ContentService::delete_module(app_state.db(), app_state.storage(), Some(&user.actor()), module_id).await?;
    ok(Empty::default(), "Module deleted successfully")
}
