//! `/courses/submissions/`: student submissions and grading.
//!
//! Create and update accept JSON or multipart with an optional `file`.

use axum::{
    Router,
    extract::{Path, Request, State},
    routing::get,
};
use db::models::submission;
use services::AppError;
use services::submission_service::{GradeInput, NewSubmission, SubmissionEdit, SubmissionService};
use util::storage::FileChange;
use util::{paths::SUBMISSIONS_DIR, state::AppState};

use crate::auth::AuthUser;
use crate::response::{ApiResult, Empty, created, ok};
use crate::routes::common::{FormBody, Upload};

const FILE_UPLOAD: Upload = Upload {
    field: "file",
    dir: SUBMISSIONS_DIR,
    images_only: false,
    max_bytes: 10 * 1024 * 1024,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses/submissions/", get(list_submissions).post(create_submission))
        .route(
            "/courses/submissions/{submission_id}/",
            get(get_submission)
                .put(update_submission)
                .patch(update_submission)
                .delete(delete_submission),
        )
}

/// GET /courses/submissions/
///
/// Students see their own submissions, instructors those for activities of
/// courses they created, admins all.
pub async fn list_submissions(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<submission::Model>> {
    let submissions = SubmissionService::list(app_state.db(), Some(&user.actor())).await?;
    ok(submissions, "Submissions retrieved successfully")
}

pub async fn get_submission(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(submission_id): Path<i64>,
) -> ApiResult<submission::Model> {
    let submission = SubmissionService::get(app_state.db(), Some(&user.actor()), submission_id).await?;
    ok(submission, "Submission retrieved successfully")
}

/// POST /courses/submissions/
///
/// ### Fields
/// - `activity_id` (required)
/// - `text_response` and/or `file`; at least one must be given
///
/// ### Responses
/// - `201 Created`; `is_late` is fixed against the activity's due date
/// - `404 Not Found` for an unknown activity
/// - `409 Conflict` when the caller already submitted for this activity
pub async fn create_submission(
    State(app_state): State<AppState>,
    user: AuthUser,
    req: Request,
) -> ApiResult<submission::Model> {
    let mut body = FormBody::read(req, app_state.storage(), &[FILE_UPLOAD]).await?;
    let activity_id = body
        .int("activity_id")?
        .ok_or_else(|| AppError::validation("activity_id", "Activity is required"))?;

    let new = NewSubmission {
        activity_id,
        text_response: body.text("text_response").unwrap_or_default(),
        file: body.take_file("file").map(FileChange::Replace).unwrap_or_default(),
    };

    let submission = SubmissionService::create(app_state.db(), Some(&user.actor()), new).await?;
    created(submission, "Submission created successfully")
}

/// PUT|PATCH /courses/submissions/{submission_id}/
///
/// Owners may change `text_response` and `file` (or clear it with
/// `remove_file`). `grade` and `feedback` are accepted from admins and the
/// course creator only.
pub async fn update_submission(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(submission_id): Path<i64>,
    req: Request,
) -> ApiResult<submission::Model> {
    let mut body = FormBody::read(req, app_state.storage(), &[FILE_UPLOAD]).await?;

    let grade = if body.has("grade") || body.has("feedback") {
        Some(GradeInput {
            grade: body.float("grade")?,
            feedback: body.text("feedback"),
        })
    } else {
        None
    };

    let edit = SubmissionEdit {
        text_response: body.text("text_response"),
        file: body.file_change("file", "remove_file"),
        grade,
    };

    let submission =
        SubmissionService::update(app_state.db(), app_state.storage(), Some(&user.actor()), submission_id, edit)
            .await?;
    ok(submission, "Submission updated successfully")
}

pub async fn delete_submission(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(submission_id): Path<i64>,
) -> ApiResult<Empty> {
    SubmissionService::delete(app_state.db(), app_state.storage(), Some(&user.actor()), submission_id).await?;
    ok(Empty::default(), "Submission deleted successfully")
}
