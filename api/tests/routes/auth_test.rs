use crate::helpers::app::PASSWORD;
use crate::helpers::{TestApp, create_user, empty_request, json_request};
use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::json;

#[tokio::test]
async fn login_issues_a_usable_token() {
    let app = TestApp::new().await;
    let (user, _) = create_user(&app, Role::Student, "ada").await;

    let (status, json) = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "ADA@test.com", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["user"]["id"], user.id);
    assert_eq!(json["data"]["user"]["role"], "student");
    assert!(json["data"]["user"].get("password_hash").is_none());

    let token = json["data"]["token"].as_str().unwrap().to_string();
    let (status, json) = app.send(empty_request("GET", "/api/profile/", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["email"], "ada@test.com");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = TestApp::new().await;
    create_user(&app, Role::Student, "ada").await;

    let (status, json) = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "ada@test.com", "password": "wrong-password" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "not-an-email", "password": PASSWORD }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let (status, json) = app.send(empty_request("GET", "/api/courses/", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);

    let (status, _) = app
        .send(empty_request("GET", "/api/courses/", Some("not.a.token")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
