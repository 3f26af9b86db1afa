//! Application state container shared across Axum route handlers and services.
//!
//! This struct holds shared resources such as the database connection and the
//! media file store. It is cheap to clone and passed into route handlers via
//! Axum's `State<T>` extractor.

use crate::storage::FileStore;
use sea_orm::DatabaseConnection;

/// Central application state shared across the server.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    storage: FileStore,
}

impl AppState {
    /// Creates a new `AppState` with the given database connection and file store.
    pub fn new(db: DatabaseConnection, storage: FileStore) -> Self {
        Self { db, storage }
    }

    /// Returns a shared reference to the internal `DatabaseConnection`.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Returns the store used for uploaded media.
    pub fn storage(&self) -> &FileStore {
        &self.storage
    }
}

impl AppState {
    /// Returns a cloned copy of the database connection.
    ///
    /// Useful for async contexts or spawning tasks that require ownership.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }
}
