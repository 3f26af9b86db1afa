//! `/courses/certificates/`: read-only. Certificates are issued by lesson
//! completion, never through this API.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use db::models::course_certificate;
use services::progress_service::ProgressService;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, ok};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses/certificates/", get(list_certificates))
        .route("/courses/certificates/{certificate_id}/", get(get_certificate))
}

pub async fn list_certificates(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<course_certificate::Model>> {
    let certificates = ProgressService::list_certificates(app_state.db(), Some(&user.actor())).await?;
    ok(certificates, "Certificates retrieved successfully")
}

pub async fn get_certificate(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(certificate_id): Path<i64>,
) -> ApiResult<course_certificate::Model> {
    let certificate =
        ProgressService::get_certificate(app_state.db(), Some(&user.actor()), certificate_id).await?;
    ok(certificate, "Certificate retrieved successfully")
}
