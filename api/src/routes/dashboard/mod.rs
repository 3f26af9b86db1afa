//! `GET /dashboard/{role}/` with `role` one of `admin`, `instructor`, `student`.

use axum::{Router, routing::get};
use util::state::AppState;

pub mod get;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard/{role}/", get(get::get_dashboard))
}
