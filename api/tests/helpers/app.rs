use api::auth::generate_jwt;
use axum::{Router, body::Body, http::Request, http::StatusCode};
use db::models::user::{Model as UserModel, Role};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use services::user_service::{RegisterUser, UserService};
use tempfile::TempDir;
use tower::ServiceExt;
use util::{state::AppState, storage::FileStore};

pub const PASSWORD: &str = "password123";

/// Router over a fresh in-memory database with storage in a temp directory.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _storage_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = setup_test_db().await;
        let storage_dir = TempDir::new().expect("Failed to create storage dir");
        let state = AppState::new(db, FileStore::new(storage_dir.path()));

        Self {
            router: api::app(state.clone()),
            state,
            _storage_dir: storage_dir,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.state.db()
    }

    pub fn storage(&self) -> &FileStore {
        self.state.storage()
    }

    /// Sends the request and returns the status with the parsed JSON body
    /// (`Value::Null` for non-JSON bodies).
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

/// Registers `name@test.com` with the given role and returns it with a token.
pub async fn create_user(app: &TestApp, role: Role, name: &str) -> (UserModel, String) {
    let user = UserService::register(
        app.db(),
        RegisterUser {
            email: format!("{name}@test.com"),
            first_name: name.to_string(),
            last_name: "tester".to_string(),
            student_number: format!("sn-{name}"),
            password: PASSWORD.to_string(),
            confirm_password: PASSWORD.to_string(),
        },
        role,
    )
    .await
    .expect("Failed to create user");
    let (token, _) = generate_jwt(user.id, user.role).unwrap();
    (user, token)
}
