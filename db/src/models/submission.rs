use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, JoinType, QueryFilter, QuerySelect};
use serde::Serialize;

use super::{activity, course_module, lesson};

/// A student's answer to an activity. One per (activity, student).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub activity_id: i64,
    pub student_id: i64,
    /// Uploaded file, relative to the storage root.
    pub file: Option<String>,
    pub text_response: String,
    pub submitted_at: DateTime<Utc>,
    pub grade: Option<f64>,
    pub feedback: String,
    /// Fixed when the submission is created.
    pub is_late: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::activity::Entity",
        from = "Column::ActivityId",
        to = "super::activity::Column::Id",
        on_delete = "Cascade"
    )]
    Activity,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activity.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Stored files of every submission under the given activities.
    pub async fn files_for_activities<C: ConnectionTrait>(
        db: &C,
        activity_ids: &[i64],
    ) -> Result<Vec<String>, DbErr> {
        if activity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let files: Vec<Option<String>> = Entity::find()
            .select_only()
            .column(Column::File)
            .filter(Column::ActivityId.is_in(activity_ids.iter().copied()))
            .into_tuple()
            .all(db)
            .await?;
        Ok(files.into_iter().flatten().collect())
    }

    /// Stored files of every submission inside a course.
    pub async fn files_for_course<C: ConnectionTrait>(db: &C, course_id: i64) -> Result<Vec<String>, DbErr> {
        let files: Vec<Option<String>> = Entity::find()
            .select_only()
            .column(Column::File)
            .join(JoinType::InnerJoin, Relation::Activity.def())
            .join(JoinType::InnerJoin, activity::Relation::Lesson.def())
            .join(JoinType::InnerJoin, lesson::Relation::Module.def())
            .filter(course_module::Column::CourseId.eq(course_id))
            .into_tuple()
            .all(db)
            .await?;
        Ok(files.into_iter().flatten().collect())
    }

    /// Stored files of every submission made by a user.
    pub async fn files_for_student<C: ConnectionTrait>(db: &C, student_id: i64) -> Result<Vec<String>, DbErr> {
        let files: Vec<Option<String>> = Entity::find()
            .select_only()
            .column(Column::File)
            .filter(Column::StudentId.eq(student_id))
            .into_tuple()
            .all(db)
            .await?;
        Ok(files.into_iter().flatten().collect())
    }
}
