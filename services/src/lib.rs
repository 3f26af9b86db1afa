pub mod content_service;
pub mod course_service;
pub mod dashboard_service;
pub mod error;
pub mod gate;
pub mod progress_service;
pub mod reconciler;
pub mod slug;
pub mod submission_service;
pub mod tree;
pub mod user_service;
pub mod views;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AppError, AppResult};
