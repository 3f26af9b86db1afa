//! Nested read views returned to clients.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use db::models::course::{self, SubmissionStatus};
use db::models::user::{self, Role};
use db::models::{activity, course_module, lesson};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::error::AppResult;
use crate::gate::Actor;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<user::Model> for UserSummary {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    #[serde(flatten)]
    pub lesson: lesson::Model,
    pub activities: Vec<activity::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleView {
    #[serde(flatten)]
    pub module: course_module::Model,
    pub lessons: Vec<LessonView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub id: i64,
    pub title: String,
    pub code: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub thumbnail: Option<String>,
    pub is_approved: bool,
    pub submission_status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub instructors: Vec<UserSummary>,
    pub modules: Vec<ModuleView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admins and instructors see review fields; everyone else does not.
fn sees_internal_fields(actor: Option<&Actor>) -> bool {
    match actor.map(|a| a.role) {
        Some(Role::Admin) | Some(Role::Instructor) => true,
        Some(Role::Student) | None => false,
    }
}

pub async fn course_view<C: ConnectionTrait>(
    db: &C,
    course: course::Model,
    actor: Option<&Actor>,
) -> AppResult<CourseView> {
    let instructor_ids = course::Model::instructor_ids(db, course.id).await?;
    let instructors = user::Entity::find()
        .filter(user::Column::Id.is_in(instructor_ids))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    let modules = load_modules(db, course.id).await?;
    let internal = sees_internal_fields(actor);

    Ok(CourseView {
        id: course.id,
        title: course.title,
        code: course.code,
        slug: course.slug,
        description: course.description,
        category: course.category,
        thumbnail: course.thumbnail,
        is_approved: course.is_approved,
        submission_status: course.submission_status,
        creator_id: internal.then_some(course.creator_id),
        feedback: if internal { course.feedback } else { None },
        instructors,
        modules,
        created_at: course.created_at,
        updated_at: course.updated_at,
    })
}

/// Modules by (order, id), lessons by (order, id), activities by id.
async fn load_modules<C: ConnectionTrait>(db: &C, course_id: i64) -> AppResult<Vec<ModuleView>> {
    let modules = course_module::Model::for_course(db, course_id).await?;
    let module_ids: Vec<i64> = modules.iter().map(|m| m.id).collect();

    let lessons = lesson::Entity::find()
        .filter(lesson::Column::ModuleId.is_in(module_ids))
        .order_by_asc(lesson::Column::Order)
        .order_by_asc(lesson::Column::Id)
        .all(db)
        .await?;
    let lesson_ids: Vec<i64> = lessons.iter().map(|l| l.id).collect();

    let mut activities_by_lesson: HashMap<i64, Vec<activity::Model>> = HashMap::new();
    for a in activity::Entity::find()
        .filter(activity::Column::LessonId.is_in(lesson_ids))
        .order_by_asc(activity::Column::Id)
        .all(db)
        .await?
    {
        activities_by_lesson.entry(a.lesson_id).or_default().push(a);
    }

    let mut lessons_by_module: HashMap<i64, Vec<LessonView>> = HashMap::new();
    for l in lessons {
        let activities = activities_by_lesson.remove(&l.id).unwrap_or_default();
        lessons_by_module
            .entry(l.module_id)
            .or_default()
            .push(LessonView { lesson: l, activities });
    }

    Ok(modules
        .into_iter()
        .map(|m| ModuleView {
            lessons: lessons_by_module.remove(&m.id).unwrap_or_default(),
            module: m,
        })
        .collect())
}
