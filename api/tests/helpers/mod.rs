pub mod app;
pub mod requests;

pub use app::{TestApp, create_user};
pub use requests::{empty_request, json_request, multipart_request};
