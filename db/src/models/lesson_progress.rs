use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter};
use serde::Serialize;

/// Completion state of one lesson for one student.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "lesson_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub lesson_id: i64,
    pub completed: bool,
    /// Set on the first transition to completed only.
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Student,

    #[sea_orm(
        belongs_to = "super::lesson::Entity",
        from = "Column::LessonId",
        to = "super::lesson::Column::Id",
        on_delete = "Cascade"
    )]
    Lesson,
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lesson.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_for<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
        lesson_id: i64,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::LessonId.eq(lesson_id))
            .one(db)
            .await
    }

    /// Number of the given lessons the student has completed.
    pub async fn count_completed<C: ConnectionTrait>(
        db: &C,
        student_id: i64,
        lesson_ids: &[i64],
    ) -> Result<u64, DbErr> {
        if lesson_ids.is_empty() {
            return Ok(0);
        }
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Completed.eq(true))
            .filter(Column::LessonId.is_in(lesson_ids.iter().copied()))
            .count(db)
            .await
    }
}
