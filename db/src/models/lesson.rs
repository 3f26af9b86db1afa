use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, JoinType, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;

use super::course_module;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub content: String,
    pub order: i32,
    pub has_quiz: bool,
    pub has_activity: bool,
    pub has_code_sandbox: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course_module::Entity",
        from = "Column::ModuleId",
        to = "super::course_module::Column::Id",
        on_delete = "Cascade"
    )]
    Module,

    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,

    #[sea_orm(has_many = "super::lesson_progress::Entity")]
    Progress,
}

impl Related<super::course_module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Module.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Lessons of a module ordered by `(order, id)`.
    pub async fn for_module<C: ConnectionTrait>(db: &C, module_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::ModuleId.eq(module_id))
            .order_by_asc(Column::Order)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    /// Ids of every lesson across all modules of a course.
    pub async fn ids_for_course<C: ConnectionTrait>(db: &C, course_id: i64) -> Result<Vec<i64>, DbErr> {
        Entity::find()
            .select_only()
            .column(Column::Id)
            .join(JoinType::InnerJoin, Relation::Module.def())
            .filter(course_module::Column::CourseId.eq(course_id))
            .into_tuple::<i64>()
            .all(db)
            .await
    }

    /// Course that owns this lesson.
    pub async fn course_id<C: ConnectionTrait>(&self, db: &C) -> Result<Option<i64>, DbErr> {
        Ok(course_module::Entity::find_by_id(self.module_id)
            .one(db)
            .await?
            .map(|m| m.course_id))
    }
}
