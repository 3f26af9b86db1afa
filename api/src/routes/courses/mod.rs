//! `/courses` routes. All require authentication; what each caller may do is
//! decided by the services.
//!
//! - `GET|POST /courses/`, `GET|PUT|PATCH|DELETE /courses/{course_id}/`
//! - `POST /courses/{course_id}/submit/`, `/approve/`, `/reject/`, `/enroll/`
//! - `/courses/modules/`, `/courses/lessons/`, `/courses/activities/`,
//!   `/courses/submissions/`: list, create, retrieve, update, delete
//! - `GET /courses/certificates/`, `GET /courses/certificates/{id}/`
//! - `POST /courses/lessons/{lesson_id}/complete/`

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod activities;
pub mod certificates;
pub mod common;
pub mod delete;
pub mod get;
pub mod lessons;
pub mod modules;
pub mod post;
pub mod put;
pub mod submissions;

pub fn courses_routes() -> Router<AppState> {
    Router::new()
        .route("/courses/", get(get::list_courses).post(post::create_course))
        .route(
            "/courses/{course_id}/",
            get(get::get_course)
                .put(put::replace_course)
                .patch(put::patch_course)
                .delete(delete::delete_course),
        )
        .route("/courses/{course_id}/submit/", post(post::submit_course))
        .route("/courses/{course_id}/approve/", post(post::approve_course))
        .route("/courses/{course_id}/reject/", post(post::reject_course))
        .route("/courses/{course_id}/enroll/", post(post::enroll))
        .merge(modules::routes())
        .merge(lessons::routes())
        .merge(activities::routes())
        .merge(submissions::routes())
        .merge(certificates::routes())
}
