//! Student submissions for activities.

use chrono::Utc;
use db::models::user::Role;
use db::models::{activity, course, course_module, lesson, submission};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};
use serde::Deserialize;
use util::storage::{FileChange, FileStore, OrphanedFiles};
use validator::Validate;

use crate::error::{conflict_on_unique, AppError, AppResult};
use crate::gate::{self, Action, Actor, Resource};

#[derive(Debug, Default)]
pub struct NewSubmission {
    pub activity_id: i64,
    pub text_response: String,
    pub file: FileChange,
}

/// Fields a student may change on their own submission.
#[derive(Debug, Default)]
pub struct SubmissionEdit {
    pub text_response: Option<String>,
    pub file: FileChange,
    pub grade: Option<GradeInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GradeInput {
    #[validate(range(min = 0.0, message = "Grade must not be negative"))]
    pub grade: Option<f64>,
    pub feedback: Option<String>,
}

pub struct SubmissionService;

impl SubmissionService {
    /// Records a submission. Lateness is fixed here against the activity's due
    /// date and never recomputed.
    pub async fn create(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        new: NewSubmission,
    ) -> AppResult<submission::Model> {
        let actor = require(actor, Action::Create)?;
        let activity = activity::Entity::find_by_id(new.activity_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Activity"))?;

        if new.text_response.trim().is_empty() && new.file.staged_path().is_none() {
            return Err(AppError::validation(
                "text_response",
                "Provide a text response or a file",
            ));
        }

        let txn = db.begin().await?;
        let existing = submission::Entity::find()
            .filter(submission::Column::ActivityId.eq(activity.id))
            .filter(submission::Column::StudentId.eq(actor.id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(already_submitted());
        }

        let submitted_at = Utc::now();
        let created = submission::ActiveModel {
            activity_id: Set(activity.id),
            student_id: Set(actor.id),
            file: Set(new.file.staged_path().map(str::to_string)),
            text_response: Set(new.text_response),
            submitted_at: Set(submitted_at),
            grade: Set(None),
            feedback: Set(String::new()),
            is_late: Set(activity.is_late_at(submitted_at)),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| conflict_on_unique(e, already_submitted().to_string()))?;
        txn.commit().await?;
        new.file.commit();

        tracing::info!(
            submission_id = created.id,
            activity_id = activity.id,
            student = actor.id,
            late = created.is_late,
            "Submission recorded"
        );
        Ok(created)
    }

    pub async fn list(db: &DatabaseConnection, actor: Option<&Actor>) -> AppResult<Vec<submission::Model>> {
        let actor = require(actor, Action::List)?;
        let query = submission::Entity::find().order_by_asc(submission::Column::Id);
        let query = match actor.role {
            Role::Admin => query,
            Role::Student => query.filter(submission::Column::StudentId.eq(actor.id)),
            Role::Instructor => query
                .join(JoinType::InnerJoin, submission::Relation::Activity.def())
                .join(JoinType::InnerJoin, activity::Relation::Lesson.def())
                .join(JoinType::InnerJoin, lesson::Relation::Module.def())
                .join(JoinType::InnerJoin, course_module::Relation::Course.def())
                .filter(course::Column::CreatorId.eq(actor.id)),
        };
        Ok(query.all(db).await?)
    }

    pub async fn get(db: &DatabaseConnection, actor: Option<&Actor>, id: i64) -> AppResult<submission::Model> {
        let actor = require(actor, Action::Retrieve)?;
        find_visible(db, actor, id).await
    }

    /// Students may edit the response or file of their own submission;
    /// admins and the course's instructor may grade it.
    pub async fn update(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: Option<&Actor>,
        id: i64,
        edit: SubmissionEdit,
    ) -> AppResult<submission::Model> {
        let actor = require(actor, Action::Update)?;
        let current = find_visible(db, actor, id).await?;

        let is_owner = current.student_id == actor.id;
        let editing_response = edit.text_response.is_some() || !matches!(edit.file, FileChange::Keep);
        if editing_response && !is_owner {
            return Err(AppError::PermissionDenied);
        }
        if edit.grade.is_some() && actor.role == Role::Student {
            return Err(AppError::PermissionDenied);
        }

        let mut orphans = OrphanedFiles::new();
        let mut active: submission::ActiveModel = current.clone().into();
        if let Some(text) = edit.text_response {
            active.text_response = Set(text);
        }
        match &edit.file {
            FileChange::Keep => {}
            FileChange::Replace(staged) => {
                orphans.push_opt(current.file.clone());
                active.file = Set(Some(staged.relative_path().to_string()));
            }
            FileChange::Remove => {
                orphans.push_opt(current.file.clone());
                active.file = Set(None);
            }
        }
        if let Some(grade) = edit.grade {
            grade.validate().map_err(|e| AppError::from_validation(&e))?;
            if let Some(g) = grade.grade {
                let activity = activity::Entity::find_by_id(current.activity_id)
                    .one(db)
                    .await?
                    .ok_or_else(|| AppError::not_found("Activity"))?;
                if g > f64::from(activity.max_score) {
                    return Err(AppError::validation(
                        "grade",
                        format!("Grade must not exceed the maximum score of {}", activity.max_score),
                    ));
                }
                active.grade = Set(Some(g));
            }
            if let Some(feedback) = grade.feedback {
                active.feedback = Set(feedback);
            }
        }

        let updated = if active.is_changed() {
            active.update(db).await?
        } else {
            current
        };
        edit.file.commit();
        storage.cleanup(orphans).await;
        Ok(updated)
    }

    pub async fn delete(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: Option<&Actor>,
        id: i64,
    ) -> AppResult<()> {
        let actor = require(actor, Action::Delete)?;
        let current = find_visible(db, actor, id).await?;

        submission::Entity::delete_by_id(current.id).exec(db).await?;

        let mut orphans = OrphanedFiles::new();
        orphans.push_opt(current.file);
        storage.cleanup(orphans).await;
        tracing::info!(submission_id = id, by = actor.id, "Submission deleted");
        Ok(())
    }
}

fn require(actor: Option<&Actor>, action: Action) -> AppResult<&Actor> {
    match actor {
        Some(a) if gate::can(Some(a), action, Resource::Submission) => Ok(a),
        _ => Err(AppError::PermissionDenied),
    }
}

fn already_submitted() -> AppError {
    AppError::Conflict("You have already submitted this activity".into())
}

/// Submission `id` if the actor owns it, created the course, or is an admin.
async fn find_visible(db: &DatabaseConnection, actor: &Actor, id: i64) -> AppResult<submission::Model> {
    let sub = submission::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Submission"))?;

    let visible = match actor.role {
        Role::Admin => true,
        Role::Student => sub.student_id == actor.id,
        Role::Instructor => course_creator_of_activity(db, sub.activity_id).await? == Some(actor.id),
    };
    if visible {
        Ok(sub)
    } else {
        Err(AppError::not_found("Submission"))
    }
}

async fn course_creator_of_activity(db: &DatabaseConnection, activity_id: i64) -> AppResult<Option<i64>> {
    let Some(activity) = activity::Entity::find_by_id(activity_id).one(db).await? else {
        return Ok(None);
    };
    let Some(lesson) = lesson::Entity::find_by_id(activity.lesson_id).one(db).await? else {
        return Ok(None);
    };
    let Some(course_id) = lesson.course_id(db).await? else {
        return Ok(None);
    };
    Ok(course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .map(|c| c.creator_id))
}
