mod auth_test;
mod content_test;
mod courses_test;
mod dashboard_test;
mod health_test;
mod profile_test;
mod progress_test;
mod submissions_test;
mod users_test;
