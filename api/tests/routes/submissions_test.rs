use crate::helpers::{TestApp, create_user, empty_request, json_request, multipart_request};
use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::json;

/// Creates a course whose only lesson holds an open and an overdue activity.
/// Returns `(open_activity_id, overdue_activity_id)`.
async fn activities(app: &TestApp, teacher: &str) -> (i64, i64) {
    let body = json!({
        "title": "Essays",
        "code": "ESS1",
        "modules": [{ "title": "M", "lessons": [{ "title": "L", "activities": [
            { "title": "Open", "activity_type": "assignment", "due_date": "2999-01-01T00:00:00Z" },
            { "title": "Overdue", "activity_type": "assignment", "due_date": "2000-01-01T00:00:00Z" }
        ] }] }]
    });
    let (status, json) = app.send(json_request("POST", "/api/courses/", Some(teacher), body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let activities = &json["data"]["modules"][0]["lessons"][0]["activities"];
    (activities[0]["id"].as_i64().unwrap(), activities[1]["id"].as_i64().unwrap())
}

#[tokio::test]
async fn students_submit_once_and_lateness_is_recorded() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;
    let (_, student) = create_user(&app, Role::Student, "pupil").await;
    let (open, overdue) = activities(&app, &teacher).await;

    let (status, json) = app
        .send(json_request(
            "POST",
            "/api/courses/submissions/",
            Some(&student),
            json!({ "activity_id": open, "text_response": "My essay" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["is_late"], false);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/courses/submissions/",
            Some(&student),
            json!({ "activity_id": open, "text_response": "Again" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = app
        .send(json_request(
            "POST",
            "/api/courses/submissions/",
            Some(&student),
            json!({ "activity_id": overdue, "text_response": "Sorry" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["is_late"], true);

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/courses/submissions/",
            Some(&student),
            json!({ "activity_id": 9999, "text_response": "?" }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn file_submissions_are_stored_and_replaced() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;
    let (_, student) = create_user(&app, Role::Student, "pupil").await;
    let (open, _) = activities(&app, &teacher).await;

    let (status, _) = app
        .send(multipart_request(
            "POST",
            "/api/courses/submissions/",
            Some(&student),
            &[("activity_id", &open.to_string())],
            &[],
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .send(multipart_request(
            "POST",
            "/api/courses/submissions/",
            Some(&student),
            &[("activity_id", &open.to_string())],
            &[("file", "essay.pdf", "application/pdf", b"%PDF-1.4")],
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["data"]["id"].as_i64().unwrap();
    let first = json["data"]["file"].as_str().unwrap().to_string();
    assert!(first.starts_with("activity_submissions/"));
    assert!(app.storage().exists(&first).await);

    let uri = format!("/api/courses/submissions/{id}/");
    let (status, json) = app
        .send(multipart_request(
            "PATCH",
            &uri,
            Some(&student),
            &[],
            &[("file", "essay-v2.pdf", "application/pdf", b"%PDF-1.5")],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let second = json["data"]["file"].as_str().unwrap().to_string();
    assert!(!app.storage().exists(&first).await);
    assert!(app.storage().exists(&second).await);

    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&student))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.storage().exists(&second).await);
}

#[tokio::test]
async fn grading_is_for_the_course_instructor() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;
    let (_, stranger) = create_user(&app, Role::Instructor, "stranger").await;
    let (_, student) = create_user(&app, Role::Student, "pupil").await;
    let (_, classmate) = create_user(&app, Role::Student, "classmate").await;
    let (open, _) = activities(&app, &teacher).await;

    let (_, json) = app
        .send(json_request(
            "POST",
            "/api/courses/submissions/",
            Some(&student),
            json!({ "activity_id": open, "text_response": "Answer" }),
        ))
        .await;
    let uri = format!("/api/courses/submissions/{}/", json["data"]["id"]);
    let grade = json!({ "grade": 87.5, "feedback": "Good work" });

    let (status, _) = app.send(json_request("PATCH", &uri, Some(&student), grade.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(json_request("PATCH", &uri, Some(&stranger), grade.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(empty_request("GET", &uri, Some(&classmate))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = app.send(json_request("PATCH", &uri, Some(&teacher), grade)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["grade"], 87.5);
    assert_eq!(json["data"]["feedback"], "Good work");

    let (status, _) = app
        .send(json_request("PATCH", &uri, Some(&teacher), json!({ "grade": -1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = app.send(empty_request("GET", "/api/courses/submissions/", Some(&teacher))).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    let (_, json) = app.send(empty_request("GET", "/api/courses/submissions/", Some(&stranger))).await;
    assert_eq!(json["data"], json!([]));
}
