use axum::extract::Request;
use serde::Deserialize;
use services::course_service::{CourseFields, CourseWrite};
use services::tree;
use util::{paths::COURSE_THUMBNAILS_DIR, state::AppState};

use crate::response::ApiError;
use crate::routes::common::{FormBody, Upload};

const THUMBNAIL_UPLOAD: Upload = Upload {
    field: "thumbnail",
    dir: COURSE_THUMBNAILS_DIR,
    images_only: true,
    max_bytes: 5 * 1024 * 1024,
};

/// Reads a course write from JSON or multipart.
///
/// `modules` may be an array or a JSON-encoded string (multipart forms can
/// only carry strings). A missing `modules` key yields `None`. A `thumbnail`
/// upload replaces the stored thumbnail; `remove_thumbnail` clears it.
pub async fn read_course_write(app_state: &AppState, req: Request) -> Result<CourseWrite, ApiError> {
    let mut body = FormBody::read(req, app_state.storage(), &[THUMBNAIL_UPLOAD]).await?;

    let fields: CourseFields = body.deserialize()?;
    let modules = match body.get("modules") {
        Some(raw) => Some(tree::parse_modules(raw)?),
        None => None,
    };
    let thumbnail = body.file_change("thumbnail", "remove_thumbnail");

    Ok(CourseWrite {
        fields,
        modules,
        thumbnail,
    })
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub feedback: String,
}
