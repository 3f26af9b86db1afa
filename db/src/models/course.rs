use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter, QuerySelect};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{course_instructor, course_student};

/// A course authored by instructors. Owns an ordered list of modules.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    /// Unique course code, e.g. `MTH101`.
    pub code: String,
    /// Generated once from the title at creation.
    pub slug: String,
    pub description: String,
    pub category: String,
    pub thumbnail: Option<String>,
    /// Never reassigned after creation.
    pub creator_id: i64,
    pub is_approved: bool,
    pub submission_status: SubmissionStatus,
    /// Reviewer feedback from the last rejection.
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review workflow state of a course.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "course_submission_status")]
#[strum(serialize_all = "lowercase")]
pub enum SubmissionStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::Draft
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,

    #[sea_orm(has_many = "super::course_module::Entity")]
    Modules,

    #[sea_orm(has_many = "super::course_certificate::Entity")]
    Certificates,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::course_module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Modules.def()
    }
}

impl Related<super::course_certificate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certificates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn find_by_code<C: ConnectionTrait>(db: &C, code: &str) -> Result<Option<Self>, DbErr> {
        Entity::find().filter(Column::Code.eq(code)).one(db).await
    }

    /// Every existing slug equal to `base` or starting with `base-`.
    pub async fn slugs_with_prefix<C: ConnectionTrait>(db: &C, base: &str) -> Result<Vec<String>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::Slug)
            .filter(
                Column::Slug
                    .eq(base)
                    .or(Column::Slug.starts_with(format!("{base}-"))),
            )
            .into_tuple::<String>()
            .all(db)
            .await
    }

    pub async fn instructor_ids<C: ConnectionTrait>(db: &C, course_id: i64) -> Result<Vec<i64>, DbErr> {
        course_instructor::Entity::find()
            .filter(course_instructor::Column::CourseId.eq(course_id))
            .all(db)
            .await
            .map(|rows| rows.into_iter().map(|r| r.user_id).collect())
    }

    pub async fn student_ids<C: ConnectionTrait>(db: &C, course_id: i64) -> Result<Vec<i64>, DbErr> {
        course_student::Entity::find()
            .filter(course_student::Column::CourseId.eq(course_id))
            .all(db)
            .await
            .map(|rows| rows.into_iter().map(|r| r.user_id).collect())
    }

    pub async fn is_enrolled<C: ConnectionTrait>(db: &C, course_id: i64, user_id: i64) -> Result<bool, DbErr> {
        Ok(course_student::Entity::find_by_id((course_id, user_id))
            .one(db)
            .await?
            .is_some())
    }
}
