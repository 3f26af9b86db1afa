use crate::helpers::app::PASSWORD;
use crate::helpers::{TestApp, create_user, json_request, multipart_request};
use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::json;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

#[tokio::test]
async fn picture_is_replaced_and_old_file_removed() {
    let app = TestApp::new().await;
    let (_, token) = create_user(&app, Role::Student, "pupil").await;

    let (status, json) = app
        .send(multipart_request(
            "PUT",
            "/api/profile/",
            Some(&token),
            &[("first_name", "mary-jane")],
            &[("profile_picture", "me.png", "image/png", PNG)],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["first_name"], "Mary-Jane");
    let first = json["data"]["profile_picture"].as_str().unwrap().to_string();
    assert!(first.starts_with("profile_pics/"));
    assert!(app.storage().exists(&first).await);

    // Same request without a file keeps the picture.
    let (_, json) = app
        .send(multipart_request("PUT", "/api/profile/", Some(&token), &[("last_name", "doe")], &[]))
        .await;
    assert_eq!(json["data"]["profile_picture"], first.as_str());
    assert!(app.storage().exists(&first).await);

    let (_, json) = app
        .send(multipart_request(
            "PUT",
            "/api/profile/",
            Some(&token),
            &[],
            &[("profile_picture", "new.png", "image/png", PNG)],
        ))
        .await;
    let second = json["data"]["profile_picture"].as_str().unwrap().to_string();
    assert_ne!(first, second);
    assert!(!app.storage().exists(&first).await);
    assert!(app.storage().exists(&second).await);

    let (_, json) = app
        .send(multipart_request("PUT", "/api/profile/", Some(&token), &[("remove_picture", "true")], &[]))
        .await;
    assert_eq!(json["data"]["profile_picture"], "default.png");
    assert!(!app.storage().exists(&second).await);
}

#[tokio::test]
async fn non_image_pictures_are_rejected() {
    let app = TestApp::new().await;
    let (_, token) = create_user(&app, Role::Student, "pupil").await;

    let (status, _) = app
        .send(multipart_request(
            "PUT",
            "/api/profile/",
            Some(&token),
            &[],
            &[("profile_picture", "notes.txt", "text/plain", b"hello")],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_accepts_json_and_checks_passwords() {
    let app = TestApp::new().await;
    let (_, token) = create_user(&app, Role::Student, "pupil").await;

    let (status, _) = app
        .send(json_request(
            "PUT",
            "/api/profile/",
            Some(&token),
            json!({ "new_password": "long-enough", "confirm_password": "different" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .send(json_request("PUT", "/api/profile/", Some(&token), json!({ "student_number": "u999" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["student_number"], "u999");
}

#[tokio::test]
async fn change_password_then_login_with_new_password() {
    let app = TestApp::new().await;
    let (_, token) = create_user(&app, Role::Student, "pupil").await;

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/change-password/",
            Some(&token),
            json!({ "old_password": "wrong", "new_password": "brand-new-pass", "confirm_password": "brand-new-pass" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/change-password/",
            Some(&token),
            json!({ "old_password": PASSWORD, "new_password": "brand-new-pass", "confirm_password": "brand-new-pass" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "pupil@test.com", "password": "brand-new-pass" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}
