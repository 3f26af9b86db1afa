//! `/auth` routes.
//!
//! - `POST /auth/login` → `login`

pub mod post;

use axum::{Router, routing::post};
use util::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(post::login))
}
