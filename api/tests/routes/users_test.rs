use crate::helpers::{TestApp, create_user, empty_request, json_request};
use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::{Value, json};

fn registration(email: &str, number: &str) -> Value {
    json!({
        "email": email,
        "first_name": "grace",
        "last_name": "HOPPER",
        "student_number": number,
        "password": "navy-cobol",
        "confirm_password": "navy-cobol"
    })
}

#[tokio::test]
async fn register_creates_a_student() {
    let app = TestApp::new().await;

    let (status, json) = app
        .send(json_request("POST", "/api/users/", None, registration("grace@uni.edu", "u100")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["username"], "grace");
    assert_eq!(json["data"]["first_name"], "Grace");
    assert_eq!(json["data"]["last_name"], "Hopper");
    assert_eq!(json["data"]["role"], "student");
    assert_eq!(json["data"]["profile_picture"], "default.png");

    let (status, json) = app
        .send(json_request("POST", "/api/users/", None, registration("grace@other.edu", "u101")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["username"], "grace1");
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let app = TestApp::new().await;
    app.send(json_request("POST", "/api/users/", None, registration("grace@uni.edu", "u100")))
        .await;

    let (status, _) = app
        .send(json_request("POST", "/api/users/", None, registration("grace@uni.edu", "u200")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(json_request("POST", "/api/users/", None, registration("new@uni.edu", "u100")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut mismatch = registration("other@uni.edu", "u300");
    mismatch["confirm_password"] = json!("something-else");
    let (status, _) = app.send(json_request("POST", "/api/users/", None, mismatch)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(json_request("POST", "/api/users/", None, registration("broken", "u400")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_users_is_admin_only() {
    let app = TestApp::new().await;
    let (_, admin) = create_user(&app, Role::Admin, "root").await;
    let (_, student) = create_user(&app, Role::Student, "pupil").await;

    let (status, _) = app.send(empty_request("GET", "/api/users/", Some(&student))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app.send(empty_request("GET", "/api/users/", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn users_delete_themselves_or_are_deleted_by_admins() {
    let app = TestApp::new().await;
    let (_, admin) = create_user(&app, Role::Admin, "root").await;
    let (alice, alice_token) = create_user(&app, Role::Student, "alice").await;
    let (bob, _) = create_user(&app, Role::Student, "bob").await;

    let uri = format!("/api/users/{}/", bob.id);
    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&alice_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/users/{}/", alice.id);
    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&alice_token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
