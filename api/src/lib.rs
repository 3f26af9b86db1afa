pub mod auth;
pub mod response;
pub mod routes;

use axum::{Router, extract::DefaultBodyLimit, middleware::from_fn};
use util::state::AppState;

use crate::auth::middleware::log_request;

/// Largest accepted request body, uploads included.
pub const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// The full application: every route under `/api`, request logging and the
/// body size limit. CORS and the listener are added by the binary.
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::routes(app_state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(log_request))
}
