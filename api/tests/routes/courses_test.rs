use crate::helpers::{TestApp, create_user, empty_request, json_request, multipart_request};
use axum::http::StatusCode;
use db::models::user::Role;
use serde_json::{Value, json};

fn algebra() -> Value {
    json!({
        "title": "Algebra I",
        "code": "MATH101",
        "description": "Linear equations",
        "category": "maths",
        "modules": [{ "title": "Basics", "lessons": [{ "title": "Variables" }] }]
    })
}

async fn create(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    app.send(json_request("POST", "/api/courses/", Some(token), body)).await
}

#[tokio::test]
async fn instructor_creates_a_course_with_its_tree() {
    let app = TestApp::new().await;
    let (teacher, token) = create_user(&app, Role::Instructor, "teach").await;

    let (status, json) = create(&app, &token, algebra()).await;
    assert_eq!(status, StatusCode::CREATED);

    let course = &json["data"];
    assert_eq!(course["slug"], "algebra-i");
    assert_eq!(course["submission_status"], "draft");
    assert_eq!(course["is_approved"], false);
    assert_eq!(course["creator_id"], teacher.id);
    assert_eq!(course["instructors"][0]["id"], teacher.id);
    assert_eq!(course["modules"].as_array().unwrap().len(), 1);
    assert_eq!(course["modules"][0]["title"], "Basics");
    assert_eq!(course["modules"][0]["lessons"].as_array().unwrap().len(), 1);
    assert_eq!(course["modules"][0]["lessons"][0]["activities"], json!([]));

    let uri = format!("/api/courses/{}/", course["id"]);
    let (status, json) = app.send(empty_request("GET", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Algebra I");
}

#[tokio::test]
async fn creation_is_instructor_only_and_codes_are_unique() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;
    let (_, student) = create_user(&app, Role::Student, "pupil").await;
    let (_, admin) = create_user(&app, Role::Admin, "root").await;

    let (status, _) = create(&app, &student, algebra()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = create(&app, &admin, algebra()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    create(&app, &teacher, algebra()).await;
    let (status, _) = create(&app, &teacher, algebra()).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn same_titles_get_numbered_slugs() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;

    let mut slugs = Vec::new();
    for code in ["GO1", "GO2", "GO3"] {
        let (status, json) = create(&app, &teacher, json!({ "title": "Intro to Go", "code": code })).await;
        assert_eq!(status, StatusCode::CREATED);
        slugs.push(json["data"]["slug"].as_str().unwrap().to_string());
    }
    assert_eq!(slugs, ["intro-to-go", "intro-to-go-1", "intro-to-go-2"]);
}

#[tokio::test]
async fn invalid_tree_reports_the_node_path() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;

    let body = json!({
        "title": "Broken",
        "code": "BRK1",
        "modules": [
            { "title": "Fine", "lessons": [] },
            { "title": "Also fine", "lessons": [{ "title": "" }] }
        ]
    });
    let (status, json) = create(&app, &teacher, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().starts_with("modules[1].lessons[0]"));

    let (_, json) = app.send(empty_request("GET", "/api/courses/", Some(&teacher))).await;
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn multipart_create_accepts_encoded_modules_and_thumbnail() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;

    let modules = json!([{ "title": "Week 1", "lessons": [{ "title": "Hello" }] }]).to_string();
    let (status, json) = app
        .send(multipart_request(
            "POST",
            "/api/courses/",
            Some(&teacher),
            &[("title", "Physics"), ("course_code", "PHY1"), ("modules", &modules)],
            &[("thumbnail", "cover.png", "image/png", b"\x89PNG fake")],
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["code"], "PHY1");
    assert_eq!(json["data"]["modules"][0]["lessons"][0]["title"], "Hello");

    let thumbnail = json["data"]["thumbnail"].as_str().unwrap().to_string();
    assert!(thumbnail.starts_with("course_thumbnails/"));
    assert!(app.storage().exists(&thumbnail).await);

    let uri = format!("/api/courses/{}/", json["data"]["id"]);
    let (status, _) = app.send(empty_request("DELETE", &uri, Some(&teacher))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.storage().exists(&thumbnail).await);
}

#[tokio::test]
async fn put_reconciles_and_patch_keeps_the_tree() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;
    let (_, json) = create(&app, &teacher, algebra()).await;
    let course_id = json["data"]["id"].as_i64().unwrap();
    let module_id = json["data"]["modules"][0]["id"].as_i64().unwrap();
    let uri = format!("/api/courses/{course_id}/");

    let body = json!({
        "title": "Algebra I",
        "code": "MATH101",
        "modules": [
            { "id": module_id, "title": "Basics (revised)", "lessons": [] },
            { "title": "Equations", "lessons": [{ "title": "Solving" }] }
        ]
    });
    let (status, json) = app.send(json_request("PUT", &uri, Some(&teacher), body)).await;
    assert_eq!(status, StatusCode::OK);
    let modules = json["data"]["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0]["id"], module_id);
    assert_eq!(modules[0]["title"], "Basics (revised)");
    assert_eq!(modules[0]["lessons"], json!([]));
    assert_eq!(modules[1]["lessons"][0]["title"], "Solving");

    let (status, json) = app
        .send(json_request("PATCH", &uri, Some(&teacher), json!({ "description": "Updated" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["description"], "Updated");
    assert_eq!(json["data"]["modules"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .send(json_request("PUT", &uri, Some(&teacher), json!({ "description": "No title" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .send(json_request("PUT", &uri, Some(&teacher), json!({ "title": "Algebra I", "code": "MATH101" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["modules"], json!([]));
}

#[tokio::test]
async fn unknown_node_ids_fail_without_changes() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;
    let (_, json) = create(&app, &teacher, algebra()).await;
    let uri = format!("/api/courses/{}/", json["data"]["id"]);

    let body = json!({ "modules": [{ "id": 9999, "title": "Ghost" }] });
    let (status, _) = app.send(json_request("PATCH", &uri, Some(&teacher), body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, json) = app.send(empty_request("GET", &uri, Some(&teacher))).await;
    assert_eq!(json["data"]["modules"][0]["title"], "Basics");
}

#[tokio::test]
async fn scope_and_permissions() {
    let app = TestApp::new().await;
    let (_, owner) = create_user(&app, Role::Instructor, "owner").await;
    let (_, other) = create_user(&app, Role::Instructor, "other").await;
    let (_, student) = create_user(&app, Role::Student, "pupil").await;
    let (_, json) = create(&app, &owner, algebra()).await;
    let uri = format!("/api/courses/{}/", json["data"]["id"]);

    let (status, _) = app.send(empty_request("GET", &uri, Some(&other))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .send(json_request("PATCH", &uri, Some(&other), json!({ "title": "Mine now" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unapproved courses are invisible to students.
    let (status, _) = app.send(empty_request("GET", &uri, Some(&student))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .send(json_request("PATCH", &uri, Some(&student), json!({ "title": "Nope" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn review_workflow_and_enrollment() {
    let app = TestApp::new().await;
    let (_, teacher) = create_user(&app, Role::Instructor, "teach").await;
    let (_, admin) = create_user(&app, Role::Admin, "root").await;
    let (_, student) = create_user(&app, Role::Student, "pupil").await;
    let (_, json) = create(&app, &teacher, algebra()).await;
    let id = json["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(empty_request("POST", &format!("/api/courses/{id}/enroll/"), Some(&student)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = app
        .send(empty_request("POST", &format!("/api/courses/{id}/submit/"), Some(&teacher)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["submission_status"], "pending");

    let (status, _) = app
        .send(empty_request("POST", &format!("/api/courses/{id}/submit/"), Some(&teacher)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let reject = format!("/api/courses/{id}/reject/");
    let (status, _) = app.send(json_request("POST", &reject, Some(&admin), json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, json) = app
        .send(json_request("POST", &reject, Some(&admin), json!({ "feedback": "Add exercises" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["submission_status"], "rejected");
    assert_eq!(json["data"]["feedback"], "Add exercises");

    let (status, _) = app
        .send(empty_request("POST", &format!("/api/courses/{id}/approve/"), Some(&teacher)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, json) = app
        .send(empty_request("POST", &format!("/api/courses/{id}/approve/"), Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["is_approved"], true);

    let (status, json) = app
        .send(empty_request("GET", &format!("/api/courses/{id}/"), Some(&student)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].get("creator_id").is_none());

    let enroll = format!("/api/courses/{id}/enroll/");
    let (status, _) = app.send(empty_request("POST", &enroll, Some(&student))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(empty_request("POST", &enroll, Some(&student))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
