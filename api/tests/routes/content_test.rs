use crate::helpers::{TestApp, create_user, empty_request, json_request};
use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::json;

async fn course_with_module(app: &TestApp, token: &str, code: &str) -> (i64, i64) {
    let (status, json) = app
        .send(json_request(
            "POST",
            "/api/courses/",
            Some(token),
            json!({ "title": format!("Course {code}"), "code": code, "modules": [{ "title": "M1" }] }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        json["data"]["id"].as_i64().unwrap(),
        json["data"]["modules"][0]["id"].as_i64().unwrap(),
    )
}

#[tokio::test]
async fn module_crud_with_nested_lessons() {
    let app = TestApp::new().await;
    let (_, token) = create_user(&app, Role::Instructor, "teach").await;
    let (course_id, _) = course_with_module(&app, &token, "C1").await;

    let (status, json) = app
        .send(json_request(
            "POST",
            "/api/courses/modules/",
            Some(&token),
            json!({ "course_id": course_id, "title": "M2", "lessons": [{ "title": "L1" }, { "title": "L2" }] }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let module_id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["order"], 1);

    let (_, json) = app
        .send(empty_request("GET", &format!("/api/courses/modules/?course_id={course_id}"), Some(&token)))
        .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let (_, json) = app
        .send(empty_request("GET", &format!("/api/courses/lessons/?module_id={module_id}"), Some(&token)))
        .await;
    let lessons = json["data"].as_array().unwrap().clone();
    assert_eq!(lessons.len(), 2);

    let uri = format!("/api/courses/modules/{module_id}/");
    let (status, json) = app
        .send(json_request("PATCH", &uri, Some(&token), json!({ "title": "Module two" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Module two");

    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let lesson_uri = format!("/api/courses/lessons/{}/", lessons[0]["id"]);
    let (status, _) = app.send(empty_request("GET", &lesson_uri, Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nodes_cannot_change_parent() {
    let app = TestApp::new().await;
    let (_, token) = create_user(&app, Role::Instructor, "teach").await;
    let (_, module_id) = course_with_module(&app, &token, "C1").await;
    let (other_course, _) = course_with_module(&app, &token, "C2").await;

    let uri = format!("/api/courses/modules/{module_id}/");
    let (status, _) = app
        .send(json_request("PUT", &uri, Some(&token), json!({ "course_id": other_course, "title": "Moved" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lessons_and_activities_validate_their_input() {
    let app = TestApp::new().await;
    let (_, token) = create_user(&app, Role::Instructor, "teach").await;
    let (_, module_id) = course_with_module(&app, &token, "C1").await;

    let (status, _) = app
        .send(json_request("POST", "/api/courses/lessons/", Some(&token), json!({ "title": "Orphan" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .send(json_request(
            "POST",
            "/api/courses/lessons/",
            Some(&token),
            json!({ "module_id": module_id, "title": "Variables", "has_quiz": true }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["has_quiz"], true);
    let lesson_id = json["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/courses/activities/",
            Some(&token),
            json!({ "lesson_id": lesson_id, "title": "Essay", "activity_type": "poem" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .send(json_request(
            "POST",
            "/api/courses/activities/",
            Some(&token),
            json!({ "lesson_id": lesson_id, "title": "Quiz", "activity_type": "quiz", "max_score": 10 }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["activity_type"], "quiz");

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/courses/lessons/",
            Some(&token),
            json!({ "module_id": 4242, "title": "Nowhere" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
