//! `/users` routes.
//!
//! - `POST /users/` → `register` (public)
//! - `GET /users/` → `list_users` (admin only)
//! - `DELETE /users/{user_id}/` → `delete_user` (admins, or the user themselves)

use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post},
};
use util::state::AppState;

use crate::auth::guards::{allow_admin, allow_authenticated};

pub mod common;
pub mod delete;
pub mod get;
pub mod post;

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", post(post::register))
        .merge(
            Router::new()
                .route("/users/", get(get::list_users))
                .route_layer(from_fn(allow_admin)),
        )
        .merge(
            Router::new()
                .route("/users/{user_id}/", delete(delete::delete_user))
                .route_layer(from_fn(allow_authenticated)),
        )
}
