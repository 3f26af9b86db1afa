//! Request body reading shared by routes that accept either JSON or
//! `multipart/form-data` with file uploads.

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use services::AppError;
use util::storage::{FileChange, FileStore, StagedFile};

use crate::response::ApiError;

/// A multipart field accepted as a file upload.
pub struct Upload {
    pub field: &'static str,
    pub dir: &'static str,
    pub images_only: bool,
    pub max_bytes: usize,
}

/// Parsed request body. Text fields of a multipart form arrive as strings;
/// uploads are staged immediately and discarded again unless committed.
#[derive(Debug, Default)]
pub struct FormBody {
    fields: Map<String, Value>,
    files: Vec<(String, StagedFile)>,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

impl FormBody {
    pub async fn read(req: Request, storage: &FileStore, uploads: &[Upload]) -> Result<Self, ApiError> {
        if !is_multipart(&req) {
            let Json(value) = Json::<Value>::from_request(req, &())
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            let Value::Object(fields) = value else {
                return Err(ApiError::bad_request("Request body must be a JSON object"));
            };
            return Ok(Self {
                fields,
                files: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        let mut body = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            let Some(upload) = uploads.iter().find(|u| u.field == name) else {
                let text = field.text().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
                body.fields.insert(name, Value::String(text));
                continue;
            };

            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| ApiError::bad_request(e.body_text()))?;

            // An empty file input means no file was chosen.
            if bytes.is_empty() {
                continue;
            }
            if upload.images_only && !content_type.as_deref().is_some_and(|ct| ct.starts_with("image/")) {
                return Err(ApiError::bad_request(format!("{name} must be an image")));
            }
            if bytes.len() > upload.max_bytes {
                return Err(ApiError::bad_request(format!("{name} is too large")));
            }

            let staged = storage
                .stage(upload.dir, &file_name, &bytes)
                .await
                .map_err(AppError::from)?;
            body.files.push((name, staged));
        }

        Ok(body)
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Checkbox-style flag: `true`, `"true"`, `"1"` and `"on"` are set.
    pub fn flag(&self, name: &str) -> bool {
        match self.fields.get(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "on"),
            _ => false,
        }
    }

    pub fn int(&self, name: &str) -> Result<Option<i64>, ApiError> {
        let parsed = match self.fields.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(_) => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| AppError::validation(name, "Must be an integer").into())
    }

    pub fn float(&self, name: &str) -> Result<Option<f64>, ApiError> {
        let parsed = match self.fields.get(name) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(_) => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| AppError::validation(name, "Must be a number").into())
    }

    /// Deserializes the scalar fields into `T`. Unknown keys are ignored.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))
    }

    pub fn take_file(&mut self, name: &str) -> Option<StagedFile> {
        let index = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.remove(index).1)
    }

    /// A new upload in `file_field` replaces the stored file; otherwise a set
    /// `remove_flag` clears it.
    pub fn file_change(&mut self, file_field: &str, remove_flag: &str) -> FileChange {
        match self.take_file(file_field) {
            Some(staged) => FileChange::Replace(staged),
            None if self.flag(remove_flag) => FileChange::Remove,
            None => FileChange::Keep,
        }
    }
}
