use chrono::Utc;
use db::models::course::{self, SubmissionStatus};
use db::models::user::{self, Role};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::Value;

use crate::course_service::{CourseFields, CourseService, CourseWrite};
use crate::gate::Actor;
use crate::tree;
use crate::views::CourseView;

pub async fn make_user(db: &DatabaseConnection, role: Role, name: &str) -> Actor {
    let now = Utc::now();
    let model = user::ActiveModel {
        email: Set(format!("{name}@example.com")),
        username: Set(name.to_string()),
        first_name: Set(name.to_string()),
        last_name: Set("Tester".to_string()),
        student_number: Set(format!("sn-{name}")),
        role: Set(role),
        profile_picture: Set("default.png".to_string()),
        password_hash: Set(user::Model::hash_password("password123").unwrap()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    Actor::new(model.id, role)
}

pub fn write(title: &str, code: &str, modules: Option<Value>) -> CourseWrite {
    CourseWrite {
        fields: CourseFields {
            title: Some(title.to_string()),
            code: Some(code.to_string()),
            description: Some("desc".to_string()),
            category: Some("maths".to_string()),
        },
        modules: modules.map(|m| tree::parse_modules(&m).unwrap()),
        ..Default::default()
    }
}

pub async fn make_course(db: &DatabaseConnection, instructor: &Actor, code: &str, modules: Value) -> CourseView {
    CourseService::create(db, Some(instructor), write(&format!("Course {code}"), code, Some(modules)))
        .await
        .unwrap()
}

/// Marks a course approved without going through the review workflow.
pub async fn publish(db: &DatabaseConnection, course_id: i64) {
    let current = course::Entity::find_by_id(course_id).one(db).await.unwrap().unwrap();
    let mut active: course::ActiveModel = current.into();
    active.is_approved = Set(true);
    active.submission_status = Set(SubmissionStatus::Approved);
    active.update(db).await.unwrap();
}

pub async fn make_published_course(
    db: &DatabaseConnection,
    instructor: &Actor,
    code: &str,
    modules: Value,
) -> CourseView {
    let view = make_course(db, instructor, code, modules).await;
    publish(db, view.id).await;
    view
}
