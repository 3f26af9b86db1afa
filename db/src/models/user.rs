use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Represents a user in the `users` table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique login email.
    pub email: String,
    /// Unique handle derived from the email local part.
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Unique student number.
    pub student_number: String,
    pub role: Role,
    /// Path relative to the storage root. `default.png` when unset.
    pub profile_picture: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// System-wide role of a user. Backed by the `user_role_type` enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role_type")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,

    #[sea_orm(string_value = "instructor")]
    Instructor,

    #[sea_orm(string_value = "student")]
    Student,
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Courses this user created.
    #[sea_orm(has_many = "super::course::Entity")]
    CreatedCourses,

    #[sea_orm(has_many = "super::submission::Entity")]
    Submissions,

    #[sea_orm(has_many = "super::lesson_progress::Entity")]
    LessonProgress,

    #[sea_orm(has_many = "super::course_certificate::Entity")]
    Certificates,
}

impl Related<super::submission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl Related<super::course_certificate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certificates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Hashes a plaintext password with Argon2 and a fresh random salt.
    pub fn hash_password(password: &str) -> Result<String, DbErr> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DbErr::Custom(format!("Password hashing failed: {e}")))
    }

    /// Checks a plaintext password against this user's stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::Email.eq(email.to_lowercase()))
            .one(db)
            .await
    }

    pub async fn email_taken<C: ConnectionTrait>(db: &C, email: &str) -> Result<bool, DbErr> {
        Ok(Self::find_by_email(db, email).await?.is_some())
    }

    pub async fn username_taken<C: ConnectionTrait>(db: &C, username: &str) -> Result<bool, DbErr> {
        Ok(Entity::find()
            .filter(Column::Username.eq(username))
            .one(db)
            .await?
            .is_some())
    }

    /// True when another user (not `except_id`) already holds this student number.
    pub async fn student_number_taken<C: ConnectionTrait>(
        db: &C,
        student_number: &str,
        except_id: Option<i64>,
    ) -> Result<bool, DbErr> {
        let mut query = Entity::find().filter(Column::StudentNumber.eq(student_number));
        if let Some(id) = except_id {
            query = query.filter(Column::Id.ne(id));
        }
        Ok(query.one(db).await?.is_some())
    }
}
