//! Per-role summary counts.

use db::models::course::{self, SubmissionStatus};
use db::models::user::{self, Role};
use db::models::{course_certificate, course_student, lesson_progress};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::gate::{self, Action, Actor, Resource};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Dashboard {
    Admin(AdminDashboard),
    Instructor(InstructorDashboard),
    Student(StudentDashboard),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminDashboard {
    pub message: String,
    pub users: u64,
    pub instructors: u64,
    pub students: u64,
    pub courses: u64,
    pub pending_review: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InstructorDashboard {
    pub message: String,
    pub courses: u64,
    pub approved: u64,
    pub pending_review: u64,
    pub enrolled_students: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentDashboard {
    pub message: String,
    pub enrolled_courses: u64,
    pub completed_lessons: u64,
    pub certificates: u64,
}

pub struct DashboardService;

impl DashboardService {
    /// Summary for the `role` dashboard. Only users holding that role may view it.
    pub async fn for_role(db: &DatabaseConnection, actor: Option<&Actor>, role: Role) -> AppResult<Dashboard> {
        let actor = match actor {
            Some(a) if gate::can(Some(a), Action::View, Resource::Dashboard(role)) => a,
            _ => return Err(AppError::PermissionDenied),
        };

        match role {
            Role::Admin => Ok(Dashboard::Admin(admin(db).await?)),
            Role::Instructor => Ok(Dashboard::Instructor(instructor(db, actor.id).await?)),
            Role::Student => Ok(Dashboard::Student(student(db, actor.id).await?)),
        }
    }
}

async fn admin(db: &DatabaseConnection) -> AppResult<AdminDashboard> {
    let count_role = |role: Role| user::Entity::find().filter(user::Column::Role.eq(role)).count(db);
    Ok(AdminDashboard {
        message: "Welcome to the Admin Dashboard!".into(),
        users: user::Entity::find().count(db).await?,
        instructors: count_role(Role::Instructor).await?,
        students: count_role(Role::Student).await?,
        courses: course::Entity::find().count(db).await?,
        pending_review: course::Entity::find()
            .filter(course::Column::SubmissionStatus.eq(SubmissionStatus::Pending))
            .count(db)
            .await?,
    })
}

async fn instructor(db: &DatabaseConnection, user_id: i64) -> AppResult<InstructorDashboard> {
    let own = course::Entity::find()
        .filter(course::Column::CreatorId.eq(user_id))
        .all(db)
        .await?;
    let course_ids: Vec<i64> = own.iter().map(|c| c.id).collect();
    let enrolled_students = course_student::Entity::find()
        .filter(course_student::Column::CourseId.is_in(course_ids))
        .count(db)
        .await?;

    Ok(InstructorDashboard {
        message: "Welcome to the Instructor Dashboard!".into(),
        courses: own.len() as u64,
        approved: own.iter().filter(|c| c.is_approved).count() as u64,
        pending_review: own
            .iter()
            .filter(|c| c.submission_status == SubmissionStatus::Pending)
            .count() as u64,
        enrolled_students,
    })
}

async fn student(db: &DatabaseConnection, user_id: i64) -> AppResult<StudentDashboard> {
    Ok(StudentDashboard {
        message: "Welcome to the Student Dashboard!".into(),
        enrolled_courses: course_student::Entity::find()
            .filter(course_student::Column::UserId.eq(user_id))
            .count(db)
            .await?,
        completed_lessons: lesson_progress::Entity::find()
            .filter(lesson_progress::Column::StudentId.eq(user_id))
            .filter(lesson_progress::Column::Completed.eq(true))
            .count(db)
            .await?,
        certificates: course_certificate::Entity::find()
            .filter(course_certificate::Column::StudentId.eq(user_id))
            .count(db)
            .await?,
    })
}
