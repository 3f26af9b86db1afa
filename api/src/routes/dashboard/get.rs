use std::str::FromStr;

use axum::extract::{Path, State};
use db::models::user::Role;
use services::dashboard_service::{Dashboard, DashboardService};
use services::AppError;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::{ApiResult, ok};

/// GET /dashboard/{role}/
///
/// Summary counts for the given role. Only users holding that role may view
/// it.
///
/// ### Responses
/// - `200 OK` with the role's summary
/// - `403 Forbidden` when the caller's role differs
/// - `404 Not Found` for an unknown role
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(role): Path<String>,
) -> ApiResult<Dashboard> {
    let role = Role::from_str(&role).map_err(|_| AppError::not_found("Dashboard"))?;
    let dashboard = DashboardService::for_role(app_state.db(), Some(&user.actor()), role).await?;
    ok(dashboard, "Dashboard retrieved successfully")
}
