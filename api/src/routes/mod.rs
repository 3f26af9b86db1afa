//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → health check (public)
//! - `/auth` → login (public)
//! - `/users` → registration (public), listing (admin), deletion (authenticated)
//! - `/profile`, `/change-password` → the caller's own account (authenticated)
//! - `/dashboard` → per-role summaries (authenticated)
//! - `/courses` → courses, content, submissions, certificates and progress (authenticated)

use axum::{Router, middleware::from_fn};
use util::state::AppState;

use crate::auth::guards::allow_authenticated;
use crate::routes::{
    auth::auth_routes, courses::courses_routes, dashboard::dashboard_routes, health::health_routes,
    profile::profile_routes, users::users_routes,
};

pub mod auth;
pub mod common;
pub mod courses;
pub mod dashboard;
pub mod health;
pub mod profile;
pub mod users;

/// Builds the complete application router for all HTTP endpoints.
///
/// Paths keep their trailing slash (`/courses/`, `/courses/{id}/`).
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(users_routes())
        .merge(profile_routes().route_layer(from_fn(allow_authenticated)))
        .merge(dashboard_routes().route_layer(from_fn(allow_authenticated)))
        .merge(courses_routes().route_layer(from_fn(allow_authenticated)))
        .with_state(app_state)
}
