use crate::helpers::{TestApp, create_user, empty_request};
use axum::http::StatusCode;
use db::models::user::Role;

#[tokio::test]
async fn dashboards_match_the_callers_role() {
    let app = TestApp::new().await;
    let (_, student) = create_user(&app, Role::Student, "pupil").await;
    let (_, admin) = create_user(&app, Role::Admin, "root").await;

    let (status, json) = app
        .send(empty_request("GET", "/api/dashboard/student/", Some(&student)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["enrolled_courses"], 0);

    let (status, _) = app
        .send(empty_request("GET", "/api/dashboard/admin/", Some(&student)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .send(empty_request("GET", "/api/dashboard/admin/", Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["users"], 2);

    let (status, _) = app
        .send(empty_request("GET", "/api/dashboard/janitor/", Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
