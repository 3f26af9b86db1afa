use crate::helpers::{TestApp, create_user, empty_request, json_request};
use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::json;

#[tokio::test]
async fn completing_every_lesson_issues_one_certificate() {
    let app = TestApp::new().await;
    let (_, admin) = create_user(&app, Role::Admin, "root").await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;
    let (_, student) = create_user(&app, Role::Student, "pupil").await;
    let (_, other) = create_user(&app, Role::Student, "other").await;

    let body = json!({
        "title": "Short course",
        "code": "SC1",
        "modules": [
            { "title": "A", "lessons": [{ "title": "A1" }, { "title": "A2" }] },
            { "title": "B", "lessons": [{ "title": "B1" }] }
        ]
    });
    let (_, json) = app.send(json_request("POST", "/api/courses/", Some(&teacher), body)).await;
    let modules = json["data"]["modules"].as_array().unwrap();
    let lessons: Vec<i64> = modules
        .iter()
        .flat_map(|m| m["lessons"].as_array().unwrap().iter())
        .map(|l| l["id"].as_i64().unwrap())
        .collect();

    let complete = |id: i64| format!("/api/courses/lessons/{id}/complete/");

    // Not visible to students until approved.
    let (status, _) = app.send(empty_request("POST", &complete(lessons[0]), Some(&student))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let approve = format!("/api/courses/{}/approve/", json["data"]["id"]);
    let (status, _) = app.send(empty_request("POST", &approve, Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);

    // Out of order, with a repeat.
    for id in [lessons[2], lessons[0], lessons[2]] {
        let (status, json) = app.send(empty_request("POST", &complete(id), Some(&student))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["certificate_issued"], false);
    }

    let (_, json) = app.send(empty_request("POST", &complete(lessons[1]), Some(&student))).await;
    assert_eq!(json["data"]["progress_updated"], true);
    assert_eq!(json["data"]["certificate_issued"], true);

    let (_, json) = app.send(empty_request("POST", &complete(lessons[1]), Some(&student))).await;
    assert_eq!(json["data"]["progress_updated"], false);
    assert_eq!(json["data"]["certificate_issued"], false);

    let (_, json) = app.send(empty_request("GET", "/api/courses/certificates/", Some(&student))).await;
    let certificates = json["data"].as_array().unwrap();
    assert_eq!(certificates.len(), 1);
    let uri = format!("/api/courses/certificates/{}/", certificates[0]["id"]);

    let (status, _) = app.send(empty_request("GET", &uri, Some(&student))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(empty_request("GET", &uri, Some(&teacher))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(empty_request("GET", &uri, Some(&other))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(empty_request("POST", &complete(99_999), Some(&student)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn certificates_cannot_be_created_through_the_api() {
    let app = TestApp::new().await;
    let (_, admin) = create_user(&app, Role::Admin, "root").await;

    let (status, _) = app
        .send(json_request("POST", "/api/courses/certificates/", Some(&admin), json!({})))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
