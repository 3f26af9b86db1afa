use crate::config;
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

/// Stored value of a user's profile picture when none was uploaded.
/// Never removed from storage.
pub const DEFAULT_AVATAR: &str = "default.png";

pub const PROFILE_PICTURES_DIR: &str = "profile_pics";
pub const COURSE_THUMBNAILS_DIR: &str = "course_thumbnails";
pub const SUBMISSIONS_DIR: &str = "activity_submissions";

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Global storage root (absolute), from `config::storage_root()`.
/// If relative in env, resolve against current_dir().
pub fn storage_root() -> PathBuf {
    let p = PathBuf::from(config::storage_root());
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

/// Keeps only the normal components of a stored relative path, so a value
/// read back from the database can never escape the storage root.
pub fn sanitize_relative(rel: &str) -> PathBuf {
    Path::new(rel)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// Lower-cased extension of an uploaded file name, limited to alphanumerics.
pub fn file_extension(original_name: &str) -> Option<String> {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// A fresh, collision-free file name that keeps the upload's extension.
/// Example: `generated_name("Me.JPG")` → `"6f1c...e2.jpg"`
pub fn generated_name(original_name: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    match file_extension(original_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id,
    }
}
