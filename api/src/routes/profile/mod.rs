//! The caller's own account.
//!
//! - `GET /profile/` → `get_profile`
//! - `PUT /profile/` → `update_profile` (JSON or multipart with `profile_picture`)
//! - `POST /change-password/` → `change_password`

use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

pub mod get;
pub mod post;
pub mod put;

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile/", get(get::get_profile).put(put::update_profile))
        .route("/change-password/", post(post::change_password))
}
