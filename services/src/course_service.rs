//! Course aggregate: the course row, its membership tables and its content
//! tree are written together inside one transaction.

use chrono::Utc;
use db::models::course::{self, SubmissionStatus};
use db::models::{course_instructor, course_student};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    Select, Set, TransactionTrait,
};
use serde::Deserialize;
use util::storage::{FileChange, FileStore, OrphanedFiles};
use validator::Validate;

use crate::error::{is_unique_violation, AppError, AppResult};
use crate::gate::{self, Action, Actor, CourseScope, Resource};
use crate::reconciler::{self, ReconcileReport};
use crate::slug::{next_available, slugify};
use crate::tree::ModuleNode;
use crate::views::{course_view, CourseView};

const SLUG_ATTEMPTS: usize = 3;

/// Scalar course fields a client may set. Anything else (creator, slug,
/// approval state) is managed by the service.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CourseFields {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[serde(alias = "course_code")]
    #[validate(length(min = 1, max = 20, message = "Course code must be between 1 and 20 characters"))]
    pub code: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,
}

impl CourseFields {
    fn trimmed(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.code = self.code.map(|c| c.trim().to_string());
        self.category = self.category.map(|c| c.trim().to_string());
        self
    }

    fn require(&self, full: bool) -> AppResult<()> {
        if !full {
            return Ok(());
        }
        if self.title.is_none() {
            return Err(AppError::validation("title", "Title is required"));
        }
        if self.code.is_none() {
            return Err(AppError::validation("code", "Course code is required"));
        }
        Ok(())
    }
}

/// Write payload for create and update.
#[derive(Debug, Default)]
pub struct CourseWrite {
    pub fields: CourseFields,
    /// `None` when the client did not send a tree at all.
    pub modules: Option<Vec<ModuleNode>>,
    pub thumbnail: FileChange,
}

pub struct CourseService;

impl CourseService {
    pub async fn create(db: &DatabaseConnection, actor: Option<&Actor>, write: CourseWrite) -> AppResult<CourseView> {
        let actor = require(actor, Action::Create)?;
        let fields = write.fields.trimmed();
        fields.validate().map_err(|e| AppError::from_validation(&e))?;
        fields.require(true)?;
        let title = fields.title.clone().unwrap_or_default();
        let code = fields.code.clone().unwrap_or_default();

        let txn = db.begin().await?;
        if course::Model::find_by_code(&txn, &code).await?.is_some() {
            return Err(code_conflict(&code));
        }

        let now = Utc::now();
        let model = course::ActiveModel {
            title: Set(title.clone()),
            code: Set(code.clone()),
            description: Set(fields.description.clone().unwrap_or_default()),
            category: Set(fields.category.clone().unwrap_or_default()),
            thumbnail: Set(write.thumbnail.staged_path().map(str::to_string)),
            creator_id: Set(actor.id),
            is_approved: Set(false),
            submission_status: Set(SubmissionStatus::Draft),
            feedback: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let created = insert_with_unique_slug(&txn, model, &title, &code).await?;

        course_instructor::ActiveModel {
            course_id: Set(created.id),
            user_id: Set(actor.id),
        }
        .insert(&txn)
        .await?;

        let modules = write.modules.unwrap_or_default();
        let report = reconciler::reconcile_course(&txn, created.id, &modules).await?;
        txn.commit().await?;
        write.thumbnail.commit();

        tracing::info!(
            course_id = created.id,
            slug = %created.slug,
            creator = actor.id,
            modules = report.modules.created,
            lessons = report.lessons.created,
            activities = report.activities.created,
            "Course created"
        );
        course_view(db, created, Some(actor)).await
    }

    /// Full (`partial == false`) or partial update. A full update with no tree
    /// empties the course; a partial update with no tree leaves it untouched.
    pub async fn update(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: Option<&Actor>,
        course_id: i64,
        write: CourseWrite,
        partial: bool,
    ) -> AppResult<CourseView> {
        let action = if partial { Action::PartialUpdate } else { Action::Update };
        let actor = require(actor, action)?;
        let fields = write.fields.trimmed();
        fields.validate().map_err(|e| AppError::from_validation(&e))?;
        fields.require(!partial)?;

        let txn = db.begin().await?;
        let current = find_scoped(&txn, Some(actor), course_id).await?;

        let mut orphans = OrphanedFiles::new();
        let changed = apply_course_fields(&txn, &current, &fields, &write.thumbnail, &mut orphans).await?;

        let report = match (&write.modules, partial) {
            (None, true) => ReconcileReport::default(),
            (modules, _) => {
                let modules = modules.as_deref().unwrap_or_default();
                reconciler::reconcile_course(&txn, course_id, modules).await?
            }
        };

        txn.commit().await?;
        write.thumbnail.commit();

        orphans.extend(report.orphaned.clone());
        let removed = storage.cleanup(orphans).await;

        tracing::info!(
            course_id,
            by = actor.id,
            fields = ?changed,
            modules = ?report.modules,
            lessons = ?report.lessons,
            activities = ?report.activities,
            files_removed = removed,
            "Course updated"
        );

        let course = course::Entity::find_by_id(course_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;
        course_view(db, course, Some(actor)).await
    }

    pub async fn delete(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: Option<&Actor>,
        course_id: i64,
    ) -> AppResult<()> {
        let actor = require(actor, Action::Delete)?;

        let txn = db.begin().await?;
        let current = find_scoped(&txn, Some(actor), course_id).await?;
        let orphans = delete_course_tree(&txn, &current).await?;
        txn.commit().await?;

        let removed = storage.cleanup(orphans).await;
        tracing::info!(course_id, by = actor.id, files_removed = removed, "Course deleted");
        Ok(())
    }

    pub async fn approve(db: &DatabaseConnection, actor: Option<&Actor>, course_id: i64) -> AppResult<CourseView> {
        let actor = require(actor, Action::Approve)?;
        let current = find_scoped(db, Some(actor), course_id).await?;

        let mut active: course::ActiveModel = current.into();
        active.is_approved = Set(true);
        active.submission_status = Set(SubmissionStatus::Approved);
        active.feedback = Set(None);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        tracing::info!(course_id, by = actor.id, "Course approved");
        course_view(db, updated, Some(actor)).await
    }

    pub async fn reject(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        course_id: i64,
        feedback: &str,
    ) -> AppResult<CourseView> {
        let actor = require(actor, Action::Reject)?;
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(AppError::validation("feedback", "Feedback is required when rejecting a course"));
        }
        let current = find_scoped(db, Some(actor), course_id).await?;

        let mut active: course::ActiveModel = current.into();
        active.is_approved = Set(false);
        active.submission_status = Set(SubmissionStatus::Rejected);
        active.feedback = Set(Some(feedback.to_string()));
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        tracing::info!(course_id, by = actor.id, "Course rejected");
        course_view(db, updated, Some(actor)).await
    }

    /// Moves a draft or rejected course to pending review.
    pub async fn submit_for_review(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        course_id: i64,
    ) -> AppResult<CourseView> {
        let actor = require(actor, Action::SubmitForReview)?;
        let current = find_scoped(db, Some(actor), course_id).await?;

        match current.submission_status {
            SubmissionStatus::Draft | SubmissionStatus::Rejected => {}
            SubmissionStatus::Pending => return Err(AppError::Conflict("Course is already pending review".into())),
            SubmissionStatus::Approved => return Err(AppError::Conflict("Course is already approved".into())),
        }

        let mut active: course::ActiveModel = current.into();
        active.submission_status = Set(SubmissionStatus::Pending);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        tracing::info!(course_id, by = actor.id, "Course submitted for review");
        course_view(db, updated, Some(actor)).await
    }

    /// Enrolls the requesting student into an approved course.
    pub async fn enroll(db: &DatabaseConnection, actor: Option<&Actor>, course_id: i64) -> AppResult<()> {
        let actor = require(actor, Action::Enroll)?;
        let current = find_scoped(db, Some(actor), course_id).await?;

        if course::Model::is_enrolled(db, current.id, actor.id).await? {
            return Err(AppError::Conflict("Already enrolled in this course".into()));
        }
        course_student::ActiveModel {
            course_id: Set(current.id),
            user_id: Set(actor.id),
        }
        .insert(db)
        .await
        .map_err(|e| crate::error::conflict_on_unique(e, "Already enrolled in this course"))?;

        tracing::info!(course_id, student = actor.id, "Student enrolled");
        Ok(())
    }

    pub async fn list(db: &DatabaseConnection, actor: Option<&Actor>) -> AppResult<Vec<CourseView>> {
        let Some(query) = scoped_query(gate::course_scope(actor)) else {
            return Ok(Vec::new());
        };
        let courses = query.order_by_asc(course::Column::Id).all(db).await?;

        let mut views = Vec::with_capacity(courses.len());
        for c in courses {
            views.push(course_view(db, c, actor).await?);
        }
        Ok(views)
    }

    pub async fn get(db: &DatabaseConnection, actor: Option<&Actor>, course_id: i64) -> AppResult<CourseView> {
        let course = find_scoped(db, actor, course_id).await?;
        course_view(db, course, actor).await
    }
}

fn require(actor: Option<&Actor>, action: Action) -> AppResult<&Actor> {
    match actor {
        Some(a) if gate::can(Some(a), action, Resource::Course) => Ok(a),
        _ => Err(AppError::PermissionDenied),
    }
}

fn code_conflict(code: &str) -> AppError {
    AppError::Conflict(format!("A course with code '{code}' already exists"))
}

fn scoped_query(scope: CourseScope) -> Option<Select<course::Entity>> {
    let query = course::Entity::find();
    match scope {
        CourseScope::None => None,
        CourseScope::All => Some(query),
        CourseScope::CreatedBy(id) => Some(query.filter(course::Column::CreatorId.eq(id))),
        CourseScope::Approved => Some(query.filter(course::Column::IsApproved.eq(true))),
    }
}

/// Course `course_id` if it lies inside the actor's read scope.
pub async fn find_scoped<C: sea_orm::ConnectionTrait>(
    db: &C,
    actor: Option<&Actor>,
    course_id: i64,
) -> AppResult<course::Model> {
    let query = scoped_query(gate::course_scope(actor)).ok_or_else(|| AppError::not_found("Course"))?;
    query
        .filter(course::Column::Id.eq(course_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Course"))
}

async fn insert_with_unique_slug(
    txn: &DatabaseTransaction,
    mut model: course::ActiveModel,
    title: &str,
    code: &str,
) -> AppResult<course::Model> {
    let base = slugify(title);
    let mut attempted: Vec<String> = Vec::new();

    for _ in 0..SLUG_ATTEMPTS {
        let mut taken = course::Model::slugs_with_prefix(txn, &base).await?;
        taken.extend(attempted.iter().cloned());
        let slug = next_available(&base, &taken);
        model.slug = Set(slug.clone());

        let savepoint = txn.begin().await?;
        match model.clone().insert(&savepoint).await {
            Ok(created) => {
                savepoint.commit().await?;
                return Ok(created);
            }
            Err(e) if is_unique_violation(&e) => {
                savepoint.rollback().await?;
                if course::Model::find_by_code(txn, code).await?.is_some() {
                    return Err(code_conflict(code));
                }
                tracing::warn!(slug = %slug, "Slug taken concurrently, retrying");
                attempted.push(slug);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut taken = course::Model::slugs_with_prefix(txn, &base).await?;
    taken.extend(attempted);
    let suggestion = next_available(&base, &taken);
    Err(AppError::Conflict(format!(
        "Could not reserve a unique slug for '{title}'; try '{suggestion}'"
    )))
}

/// Applies the whitelisted scalar fields and thumbnail change. Returns the
/// names of the fields that changed.
async fn apply_course_fields(
    txn: &DatabaseTransaction,
    current: &course::Model,
    fields: &CourseFields,
    thumbnail: &FileChange,
    orphans: &mut OrphanedFiles,
) -> AppResult<Vec<&'static str>> {
    let mut changed = Vec::new();
    let mut active: course::ActiveModel = current.clone().into();

    if let Some(title) = &fields.title {
        if *title != current.title {
            active.title = Set(title.clone());
            changed.push("title");
        }
    }
    if let Some(code) = &fields.code {
        if *code != current.code {
            if course::Model::find_by_code(txn, code).await?.is_some() {
                return Err(code_conflict(code));
            }
            active.code = Set(code.clone());
            changed.push("code");
        }
    }
    if let Some(description) = &fields.description {
        if *description != current.description {
            active.description = Set(description.clone());
            changed.push("description");
        }
    }
    if let Some(category) = &fields.category {
        if *category != current.category {
            active.category = Set(category.clone());
            changed.push("category");
        }
    }
    match thumbnail {
        FileChange::Keep => {}
        FileChange::Replace(staged) => {
            orphans.push_opt(current.thumbnail.clone());
            active.thumbnail = Set(Some(staged.relative_path().to_string()));
            changed.push("thumbnail");
        }
        FileChange::Remove => {
            if current.thumbnail.is_some() {
                orphans.push_opt(current.thumbnail.clone());
                active.thumbnail = Set(None);
                changed.push("thumbnail");
            }
        }
    }

    if !changed.is_empty() {
        active.updated_at = Set(Utc::now());
        active
            .update(txn)
            .await
            .map_err(|e| crate::error::conflict_on_unique(e, "Course code already exists"))?;
    }
    Ok(changed)
}

/// Deletes a course with its whole tree. Returns the files it referenced.
pub(crate) async fn delete_course_tree<C: sea_orm::ConnectionTrait>(
    db: &C,
    current: &course::Model,
) -> AppResult<OrphanedFiles> {
    let mut report = ReconcileReport::default();
    let module_ids: Vec<i64> = db::models::course_module::Model::for_course(db, current.id)
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();
    reconciler::delete_modules(db, &module_ids, &mut report).await?;

    course::Entity::delete_by_id(current.id).exec(db).await?;

    let mut orphans = report.orphaned;
    orphans.push_opt(current.thumbnail.clone());
    Ok(orphans)
}
