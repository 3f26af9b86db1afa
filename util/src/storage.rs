//! File storage for uploaded media (profile pictures, course thumbnails,
//! submission files).
//!
//! Records in the database only hold a path relative to the storage root.
//! Uploads are written as a [`StagedFile`] before the owning transaction
//! commits: if the staged file is dropped without [`StagedFile::keep`] being
//! called the file is removed again, so a failed request never leaves an
//! orphan behind. Files that become unreferenced after a successful commit are
//! collected in [`OrphanedFiles`] and handed to [`FileStore::cleanup`].

use crate::paths::{self, DEFAULT_AVATAR};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at `config::storage_root()`.
    pub fn from_config() -> Self {
        Self::new(paths::storage_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored relative path.
    pub fn absolute(&self, rel: &str) -> PathBuf {
        self.root.join(paths::sanitize_relative(rel))
    }

    pub async fn exists(&self, rel: &str) -> bool {
        tokio::fs::try_exists(self.absolute(rel)).await.unwrap_or(false)
    }

    /// Writes `bytes` under `dir` with a generated name and returns the guard
    /// owning the new file.
    pub async fn stage(&self, dir: &str, original_name: &str, bytes: &[u8]) -> io::Result<StagedFile> {
        let rel = format!("{}/{}", dir, paths::generated_name(original_name));
        let abs = self.absolute(&rel);
        paths::ensure_parent_dir(&abs)?;
        tokio::fs::write(&abs, bytes).await?;

        tracing::debug!(path = %rel, size = bytes.len(), "Staged upload");
        Ok(StagedFile {
            abs,
            rel,
            kept: false,
        })
    }

    /// Removes a stored file. Returns `Ok(false)` when there was nothing to remove.
    /// The default avatar is never removed.
    pub async fn remove(&self, rel: &str) -> io::Result<bool> {
        if rel.is_empty() || rel == DEFAULT_AVATAR {
            return Ok(false);
        }
        match tokio::fs::remove_file(self.absolute(rel)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Removes every orphaned file. Failures are logged, not returned: the
    /// database change that orphaned them has already been committed.
    pub async fn cleanup(&self, orphans: OrphanedFiles) -> usize {
        let mut removed = 0;
        for rel in orphans.into_paths() {
            match self.remove(&rel).await {
                Ok(true) => {
                    removed += 1;
                    tracing::info!(path = %rel, "Removed orphaned file");
                }
                Ok(false) => {}
                Err(e) => tracing::warn!(path = %rel, error = %e, "Failed to remove orphaned file"),
            }
        }
        removed
    }
}

/// An uploaded file that is deleted on drop unless kept.
#[derive(Debug)]
pub struct StagedFile {
    abs: PathBuf,
    rel: String,
    kept: bool,
}

impl StagedFile {
    pub fn relative_path(&self) -> &str {
        &self.rel
    }

    /// Marks the file as referenced by committed state and returns its relative path.
    pub fn keep(mut self) -> String {
        self.kept = true;
        std::mem::take(&mut self.rel)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.kept {
            if let Err(e) = std::fs::remove_file(&self.abs) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.abs.display(), error = %e, "Failed to discard staged upload");
                }
            }
        }
    }
}

/// Requested change to a stored file reference.
#[derive(Debug, Default)]
pub enum FileChange {
    #[default]
    Keep,
    Replace(StagedFile),
    Remove,
}

impl FileChange {
    /// Relative path of the staged replacement, if any.
    pub fn staged_path(&self) -> Option<&str> {
        match self {
            FileChange::Replace(staged) => Some(staged.relative_path()),
            FileChange::Keep | FileChange::Remove => None,
        }
    }

    /// Keeps the staged replacement. Call only after the referencing change committed.
    pub fn commit(self) {
        if let FileChange::Replace(staged) = self {
            staged.keep();
        }
    }
}

/// Relative paths that lost their last reference in a committed change.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrphanedFiles(Vec<String>);

impl OrphanedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rel: impl Into<String>) {
        let rel = rel.into();
        if !rel.is_empty() && rel != DEFAULT_AVATAR && !self.0.contains(&rel) {
            self.0.push(rel);
        }
    }

    pub fn push_opt(&mut self, rel: Option<String>) {
        if let Some(rel) = rel {
            self.push(rel);
        }
    }

    pub fn extend(&mut self, other: OrphanedFiles) {
        for rel in other.0 {
            self.push(rel);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }

    pub fn into_paths(self) -> Vec<String> {
        self.0
    }
}
