use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub lesson_id: i64,
    pub title: String,
    pub activity_type: ActivityType,
    pub instructions: String,
    pub max_score: i32,
    /// Submissions after this instant are flagged late.
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "activity_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ActivityType {
    #[sea_orm(string_value = "quiz")]
    Quiz,
    #[sea_orm(string_value = "sandbox")]
    Sandbox,
    #[sea_orm(string_value = "assignment")]
    Assignment,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lesson::Entity",
        from = "Column::LessonId",
        to = "super::lesson::Column::Id",
        on_delete = "Cascade"
    )]
    Lesson,

    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,
}

impl Related<super::lesson::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lesson.def()
    }
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Activities of a lesson ordered by id.
    pub async fn for_lesson<C: ConnectionTrait>(db: &C, lesson_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::LessonId.eq(lesson_id))
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Whether a submission made at `at` counts as late. Activities without a
    /// due date never are.
    pub fn is_late_at(&self, at: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| at > due)
    }
}
