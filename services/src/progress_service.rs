//! Lesson completion and certificate issuance.

use chrono::Utc;
use db::models::user::Role;
use db::models::{course, course_certificate, lesson, lesson_progress};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;

use crate::course_service::find_scoped;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::gate::{self, Action, Actor, Resource};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletionOutcome {
    /// The lesson moved to completed by this call.
    pub progress_updated: bool,
    /// A certificate was issued by this call.
    pub certificate_issued: bool,
}

pub struct ProgressService;

impl ProgressService {
    /// Marks `lesson_id` completed for the actor and issues the course
    /// certificate once every lesson of the course is completed.
    ///
    /// Repeated calls are no-ops. A certificate that already exists, or that a
    /// concurrent request inserted first, is reported as not issued. Lessons
    /// of courses the actor cannot read are not found.
    pub async fn record_completion(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        lesson_id: i64,
    ) -> AppResult<CompletionOutcome> {
        let actor = match actor {
            Some(a) if gate::can(Some(a), Action::Update, Resource::Progress) => a,
            _ => return Err(AppError::PermissionDenied),
        };

        let txn = db.begin().await?;
        let lesson = lesson::Entity::find_by_id(lesson_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Lesson"))?;
        let course_id = lesson
            .course_id(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;
        // Lessons of courses outside the actor's read scope do not exist for them.
        find_scoped(&txn, Some(actor), course_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::not_found("Lesson"),
                other => other,
            })?;

        let progress_updated = mark_completed(&txn, actor.id, lesson.id).await?;
        let certificate_issued = issue_certificate_if_complete(&txn, actor.id, course_id).await?;
        txn.commit().await?;

        if certificate_issued {
            tracing::info!(student = actor.id, course_id, "Certificate issued");
        }
        Ok(CompletionOutcome {
            progress_updated,
            certificate_issued,
        })
    }

    /// Admins see every certificate, instructors those of courses they
    /// created, students their own.
    pub async fn list_certificates(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
    ) -> AppResult<Vec<course_certificate::Model>> {
        let actor = require_read(actor)?;
        let mut query = course_certificate::Entity::find().order_by_asc(course_certificate::Column::Id);
        match actor.role {
            Role::Admin => {}
            Role::Instructor => {
                let own_courses: Vec<i64> = course::Entity::find()
                    .filter(course::Column::CreatorId.eq(actor.id))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|c| c.id)
                    .collect();
                query = query.filter(course_certificate::Column::CourseId.is_in(own_courses));
            }
            Role::Student => {
                query = query.filter(course_certificate::Column::StudentId.eq(actor.id));
            }
        }
        Ok(query.all(db).await?)
    }

    pub async fn get_certificate(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        certificate_id: i64,
    ) -> AppResult<course_certificate::Model> {
        let actor = require_read(actor)?;
        let cert = course_certificate::Entity::find_by_id(certificate_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found("Certificate"))?;

        let visible = match actor.role {
            Role::Admin => true,
            Role::Student => cert.student_id == actor.id,
            Role::Instructor => course::Entity::find_by_id(cert.course_id)
                .one(db)
                .await?
                .is_some_and(|c| c.creator_id == actor.id),
        };
        if visible {
            Ok(cert)
        } else {
            Err(AppError::not_found("Certificate"))
        }
    }
}

fn require_read(actor: Option<&Actor>) -> AppResult<&Actor> {
    match actor {
        Some(a) if gate::can(Some(a), Action::List, Resource::Certificate) => Ok(a),
        _ => Err(AppError::PermissionDenied),
    }
}

/// Upserts the progress row. True on the first transition to completed.
async fn mark_completed<C: ConnectionTrait>(db: &C, student_id: i64, lesson_id: i64) -> AppResult<bool> {
    match lesson_progress::Model::find_for(db, student_id, lesson_id).await? {
        Some(p) if p.completed => Ok(false),
        Some(p) => {
            let mut active: lesson_progress::ActiveModel = p.into();
            active.completed = Set(true);
            active.completed_at = Set(Some(Utc::now()));
            active.update(db).await?;
            Ok(true)
        }
        None => insert_completed(db, student_id, lesson_id).await,
    }
}

/// Inserts a completed progress row. False when a concurrent request got
/// there first.
async fn insert_completed<C: ConnectionTrait>(db: &C, student_id: i64, lesson_id: i64) -> AppResult<bool> {
    let progress = lesson_progress::ActiveModel {
        student_id: Set(student_id),
        lesson_id: Set(lesson_id),
        completed: Set(true),
        completed_at: Set(Some(Utc::now())),
        ..Default::default()
    };
    let inserted = lesson_progress::Entity::insert(progress)
        .on_conflict(
            OnConflict::columns([lesson_progress::Column::StudentId, lesson_progress::Column::LessonId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match inserted {
        Ok(rows) => Ok(rows > 0),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn issue_certificate_if_complete<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
    course_id: i64,
) -> AppResult<bool> {
    let lesson_ids = lesson::Model::ids_for_course(db, course_id).await?;
    if lesson_ids.is_empty() {
        return Ok(false);
    }
    let completed = lesson_progress::Model::count_completed(db, student_id, &lesson_ids).await?;
    if completed < lesson_ids.len() as u64 {
        return Ok(false);
    }
    if course_certificate::Model::find_for(db, student_id, course_id)
        .await?
        .is_some()
    {
        return Ok(false);
    }

    insert_certificate(db, student_id, course_id).await
}

/// Inserts the certificate. False when one already exists.
async fn insert_certificate<C: ConnectionTrait>(db: &C, student_id: i64, course_id: i64) -> AppResult<bool> {
    let cert = course_certificate::ActiveModel {
        student_id: Set(student_id),
        course_id: Set(course_id),
        issued_at: Set(Utc::now()),
        ..Default::default()
    };
    let inserted = course_certificate::Entity::insert(cert)
        .on_conflict(
            OnConflict::columns([
                course_certificate::Column::StudentId,
                course_certificate::Column::CourseId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match inserted {
        Ok(rows) => Ok(rows > 0),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
