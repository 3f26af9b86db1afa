pub mod course;
pub mod enrollment;
pub mod user;

use db::models::user::{Column, Entity, Role};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use services::gate::Actor;
use services::AppResult;

pub const PASSWORD: &str = "password123";

/// Every user with `role`, oldest first.
pub async fn actors_with_role(db: &DatabaseConnection, role: Role) -> AppResult<Vec<Actor>> {
    Ok(Entity::find()
        .filter(Column::Role.eq(role))
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|u| Actor::new(u.id, u.role))
        .collect())
}
