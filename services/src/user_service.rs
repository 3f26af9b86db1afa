use chrono::Utc;
use db::models::user::{self, Model, Role};
use db::models::{course, submission};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use util::paths::DEFAULT_AVATAR;
use util::storage::{FileChange, FileStore, OrphanedFiles};
use validator::Validate;

use crate::error::{conflict_on_unique, AppError, AppResult};
use crate::gate::Actor;

pub const MIN_PASSWORD_LEN: u64 = 8;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 150, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, max = 20, message = "Student number must be between 1 and 20 characters"))]
    pub student_number: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub student_number: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
    pub picture: FileChange,
}

/// Title-cases every alphabetic run: `mary-jane o'neil` → `Mary-Jane O'Neil`.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.trim().chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Username candidate from the local part of an email address.
pub fn username_base(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default().to_lowercase();
    let cleaned: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.is_empty() {
        "user".to_string()
    } else {
        cleaned
    }
}

fn check_password_pair(password: &str, confirm: &str) -> AppResult<()> {
    if (password.chars().count() as u64) < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "new_password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password != confirm {
        return Err(AppError::validation("confirm_password", "Passwords do not match."));
    }
    Ok(())
}

pub struct UserService;

impl UserService {
    /// Creates a user with the given role. Public registration always uses
    /// [`Role::Student`].
    pub async fn register(db: &DatabaseConnection, input: RegisterUser, role: Role) -> AppResult<Model> {
        input.validate().map_err(|e| AppError::from_validation(&e))?;
        if input.password != input.confirm_password {
            return Err(AppError::validation("password", "Passwords do not match."));
        }

        let email = input.email.trim().to_lowercase();
        let student_number = input.student_number.trim().to_string();
        if Model::email_taken(db, &email).await? {
            return Err(AppError::Conflict("A user with this email already exists".into()));
        }
        if Model::student_number_taken(db, &student_number, None).await? {
            return Err(AppError::Conflict("A user with this student number already exists".into()));
        }

        let username = Self::available_username(db, &email).await?;
        let now = Utc::now();
        let created = user::ActiveModel {
            email: Set(email),
            username: Set(username),
            first_name: Set(title_case(&input.first_name)),
            last_name: Set(title_case(&input.last_name)),
            student_number: Set(student_number),
            role: Set(role),
            profile_picture: Set(DEFAULT_AVATAR.to_string()),
            password_hash: Set(Model::hash_password(&input.password)?),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| conflict_on_unique(e, "A user with these details already exists"))?;

        tracing::info!(user_id = created.id, role = %created.role, "User registered");
        Ok(created)
    }

    async fn available_username(db: &DatabaseConnection, email: &str) -> AppResult<String> {
        let base = username_base(email);
        if !Model::username_taken(db, &base).await? {
            return Ok(base);
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}{n}");
            if !Model::username_taken(db, &candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    /// The active user matching the credentials, if any.
    pub async fn verify_credentials(db: &DatabaseConnection, email: &str, password: &str) -> AppResult<Option<Model>> {
        let Some(user) = Model::find_by_email(db, email.trim()).await? else {
            return Ok(None);
        };
        if user.is_active && user.verify_password(password) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn get(db: &DatabaseConnection, id: i64) -> AppResult<Model> {
        user::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn list(db: &DatabaseConnection) -> AppResult<Vec<Model>> {
        Ok(user::Entity::find().order_by_asc(user::Column::Id).all(db).await?)
    }

    pub async fn change_password(db: &DatabaseConnection, actor: &Actor, input: ChangePassword) -> AppResult<()> {
        let user = Self::get(db, actor.id).await?;
        if !user.verify_password(&input.old_password) {
            return Err(AppError::validation("old_password", "Incorrect old password."));
        }
        if input.old_password == input.new_password {
            return Err(AppError::validation(
                "new_password",
                "New password must be different from the old password.",
            ));
        }
        check_password_pair(&input.new_password, &input.confirm_password)?;

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(Model::hash_password(&input.new_password)?);
        active.updated_at = Set(Utc::now());
        active.update(db).await?;

        tracing::info!(user_id = actor.id, "Password changed");
        Ok(())
    }

    /// Updates the actor's own profile.
    ///
    /// A replaced picture is removed from storage only when the stored path
    /// actually changes and is not the default avatar. Removing the picture
    /// resets it to the default avatar.
    pub async fn update_profile(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: &Actor,
        update: ProfileUpdate,
    ) -> AppResult<Model> {
        let current = Self::get(db, actor.id).await?;
        let mut active: user::ActiveModel = current.clone().into();
        let mut orphans = OrphanedFiles::new();

        if let Some(first) = update.first_name.as_deref().map(title_case) {
            if first.is_empty() {
                return Err(AppError::validation("first_name", "First name must not be blank"));
            }
            if first != current.first_name {
                active.first_name = Set(first);
            }
        }
        if let Some(last) = update.last_name.as_deref().map(title_case) {
            if last.is_empty() {
                return Err(AppError::validation("last_name", "Last name must not be blank"));
            }
            if last != current.last_name {
                active.last_name = Set(last);
            }
        }
        if let Some(number) = update.student_number.as_deref().map(str::trim) {
            if number.is_empty() || number.chars().count() > 20 {
                return Err(AppError::validation(
                    "student_number",
                    "Student number must be between 1 and 20 characters",
                ));
            }
            if number != current.student_number {
                if Model::student_number_taken(db, number, Some(current.id)).await? {
                    return Err(AppError::Conflict("A user with this student number already exists".into()));
                }
                active.student_number = Set(number.to_string());
            }
        }
        match (&update.new_password, &update.confirm_password) {
            (None, None) => {}
            (new, confirm) => {
                let new = new.as_deref().unwrap_or_default();
                check_password_pair(new, confirm.as_deref().unwrap_or_default())?;
                active.password_hash = Set(Model::hash_password(new)?);
            }
        }

        let next_picture = match &update.picture {
            FileChange::Keep => None,
            FileChange::Replace(staged) => Some(staged.relative_path().to_string()),
            FileChange::Remove => Some(DEFAULT_AVATAR.to_string()),
        };
        if let Some(next) = next_picture {
            if next != current.profile_picture {
                orphans.push(current.profile_picture.clone());
                active.profile_picture = Set(next);
            }
        }

        let updated = if active.is_changed() {
            active.updated_at = Set(Utc::now());
            active
                .update(db)
                .await
                .map_err(|e| conflict_on_unique(e, "A user with these details already exists"))?
        } else {
            current
        };
        update.picture.commit();

        let removed = storage.cleanup(orphans).await;
        tracing::info!(user_id = actor.id, files_removed = removed, "Profile updated");
        Ok(updated)
    }

    /// Deletes a user with everything that cascades from them. Admins may
    /// delete anyone; other users only themselves.
    pub async fn delete(db: &DatabaseConnection, storage: &FileStore, actor: &Actor, user_id: i64) -> AppResult<()> {
        if actor.role != Role::Admin && actor.id != user_id {
            return Err(AppError::PermissionDenied);
        }

        let txn = db.begin().await?;
        let target = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let mut orphans = OrphanedFiles::new();
        orphans.push(target.profile_picture.clone());
        for file in submission::Model::files_for_student(&txn, user_id).await? {
            orphans.push(file);
        }
        let created_courses = course::Entity::find()
            .filter(course::Column::CreatorId.eq(user_id))
            .all(&txn)
            .await?;
        for c in &created_courses {
            orphans.extend(crate::course_service::delete_course_tree(&txn, c).await?);
        }

        user::Entity::delete_by_id(user_id).exec(&txn).await?;
        txn.commit().await?;

        let removed = storage.cleanup(orphans).await;
        tracing::info!(user_id, by = actor.id, files_removed = removed, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_title_cased() {
        assert_eq!(title_case("  mary-jane o'neil "), "Mary-Jane O'Neil");
        assert_eq!(title_case("DE LA CRUZ"), "De La Cruz");
    }

    #[test]
    fn username_base_uses_local_part() {
        assert_eq!(username_base("Jane.Doe+lms@example.com"), "jane.doelms");
        assert_eq!(username_base("@example.com"), "user");
    }

    use crate::test_support::make_user;
    use db::test_utils::setup_test_db;
    use tempfile::TempDir;

    fn registration(email: &str, number: &str) -> RegisterUser {
        RegisterUser {
            email: email.into(),
            first_name: "ada".into(),
            last_name: "LOVELACE".into(),
            student_number: number.into(),
            password: "correct-horse".into(),
            confirm_password: "correct-horse".into(),
        }
    }

    #[tokio::test]
    async fn register_derives_unique_usernames() {
        let db = setup_test_db().await;
        let a = UserService::register(&db, registration("ada@uni.edu", "u1"), Role::Student)
            .await
            .unwrap();
        let b = UserService::register(&db, registration("ada@other.edu", "u2"), Role::Student)
            .await
            .unwrap();

        assert_eq!(a.username, "ada");
        assert_eq!(b.username, "ada1");
        assert_eq!(a.first_name, "Ada");
        assert_eq!(a.last_name, "Lovelace");
        assert_eq!(a.profile_picture, DEFAULT_AVATAR);
        assert!(a.verify_password("correct-horse"));
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_mismatched_passwords() {
        let db = setup_test_db().await;
        UserService::register(&db, registration("ada@uni.edu", "u1"), Role::Student)
            .await
            .unwrap();

        let err = UserService::register(&db, registration("ADA@uni.edu", "u9"), Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut bad = registration("bob@uni.edu", "u2");
        bad.confirm_password = "different".into();
        let err = UserService::register(&db, bad, Role::Student).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "password"));
    }

    #[tokio::test]
    async fn credentials_are_checked() {
        let db = setup_test_db().await;
        UserService::register(&db, registration("ada@uni.edu", "u1"), Role::Student)
            .await
            .unwrap();

        assert!(UserService::verify_credentials(&db, "ada@uni.edu", "correct-horse")
            .await
            .unwrap()
            .is_some());
        assert!(UserService::verify_credentials(&db, "ada@uni.edu", "wrong")
            .await
            .unwrap()
            .is_none());
        assert!(UserService::verify_credentials(&db, "nobody@uni.edu", "correct-horse")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn change_password_rules() {
        let db = setup_test_db().await;
        let actor = make_user(&db, Role::Student, "pupil").await;

        let wrong_old = ChangePassword {
            old_password: "nope".into(),
            new_password: "another-pass".into(),
            confirm_password: "another-pass".into(),
        };
        let err = UserService::change_password(&db, &actor, wrong_old).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "old_password"));

        let same = ChangePassword {
            old_password: "password123".into(),
            new_password: "password123".into(),
            confirm_password: "password123".into(),
        };
        let err = UserService::change_password(&db, &actor, same).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "new_password"));

        let ok = ChangePassword {
            old_password: "password123".into(),
            new_password: "another-pass".into(),
            confirm_password: "another-pass".into(),
        };
        UserService::change_password(&db, &actor, ok).await.unwrap();
        assert!(UserService::get(&db, actor.id).await.unwrap().verify_password("another-pass"));
    }

    #[tokio::test]
    async fn profile_picture_replaced_only_when_changed() {
        let db = setup_test_db().await;
        let dir = TempDir::new().unwrap();
        let storage = FileStore::new(dir.path());
        std::fs::write(dir.path().join(DEFAULT_AVATAR), b"default").unwrap();
        let actor = make_user(&db, Role::Student, "pupil").await;

        let first = ProfileUpdate {
            picture: FileChange::Replace(storage.stage("profile_pics", "me.png", b"1").await.unwrap()),
            ..Default::default()
        };
        let user = UserService::update_profile(&db, &storage, &actor, first).await.unwrap();
        let pic1 = user.profile_picture.clone();
        // The default avatar is shared and never removed.
        assert!(storage.exists(DEFAULT_AVATAR).await);

        let names_only = ProfileUpdate {
            first_name: Some("grace".into()),
            ..Default::default()
        };
        let user = UserService::update_profile(&db, &storage, &actor, names_only).await.unwrap();
        assert_eq!(user.first_name, "Grace");
        assert_eq!(user.profile_picture, pic1);
        assert!(storage.exists(&pic1).await);

        let second = ProfileUpdate {
            picture: FileChange::Replace(storage.stage("profile_pics", "me2.png", b"2").await.unwrap()),
            ..Default::default()
        };
        let user = UserService::update_profile(&db, &storage, &actor, second).await.unwrap();
        assert!(!storage.exists(&pic1).await);
        assert!(storage.exists(&user.profile_picture).await);

        let pic2 = user.profile_picture.clone();
        let remove = ProfileUpdate {
            picture: FileChange::Remove,
            ..Default::default()
        };
        let user = UserService::update_profile(&db, &storage, &actor, remove).await.unwrap();
        assert_eq!(user.profile_picture, DEFAULT_AVATAR);
        assert!(!storage.exists(&pic2).await);
        assert!(storage.exists(DEFAULT_AVATAR).await);
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_picture() {
        let db = setup_test_db().await;
        let dir = TempDir::new().unwrap();
        let storage = FileStore::new(dir.path());
        let actor = make_user(&db, Role::Student, "pupil").await;
        let other = make_user(&db, Role::Student, "other").await;

        let update = ProfileUpdate {
            picture: FileChange::Replace(storage.stage("profile_pics", "me.png", b"1").await.unwrap()),
            ..Default::default()
        };
        let user = UserService::update_profile(&db, &storage, &actor, update).await.unwrap();

        let err = UserService::delete(&db, &storage, &other, actor.id).await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));

        UserService::delete(&db, &storage, &actor, actor.id).await.unwrap();
        assert!(!storage.exists(&user.profile_picture).await);
        assert!(matches!(UserService::get(&db, actor.id).await, Err(AppError::NotFound(_))));
    }
}
