//! Converges the persisted modules/lessons/activities of a course to a
//! submitted tree.
//!
//! Each level is handled the same way: load the parent's current children
//! keyed by id, update or create every submitted node (recursing into its
//! children before moving to the next sibling), then delete whatever was not
//! submitted. Deletion cascades explicitly down to submissions and progress
//! rows so that submission files can be collected as orphans.
//!
//! Callers run this inside a transaction and clean up
//! [`ReconcileReport::orphaned`] only after committing.

use std::collections::{HashMap, HashSet};

use db::models::{activity, course_module, lesson, lesson_progress, submission};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set};
use serde::Serialize;
use util::storage::OrphanedFiles;

use crate::error::{AppError, AppResult};
use crate::tree::{ActivityNode, LessonNode, ModuleNode};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl LevelCounts {
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub modules: LevelCounts,
    pub lessons: LevelCounts,
    pub activities: LevelCounts,
    #[serde(skip)]
    pub orphaned: OrphanedFiles,
}

impl ReconcileReport {
    /// True when nothing was written.
    pub fn is_noop(&self) -> bool {
        self.modules.is_empty() && self.lessons.is_empty() && self.activities.is_empty()
    }
}

pub async fn reconcile_course<C: ConnectionTrait>(
    db: &C,
    course_id: i64,
    modules: &[ModuleNode],
) -> AppResult<ReconcileReport> {
    let mut report = ReconcileReport::default();

    let existing: HashMap<i64, course_module::Model> = course_module::Model::for_course(db, course_id)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let mut kept = HashSet::new();

    for (position, node) in modules.iter().enumerate() {
        let module_id = match node.id {
            Some(id) => {
                let current = existing
                    .get(&id)
                    .ok_or_else(|| AppError::not_found(format!("Module {id} in this course ({})", node.path)))?;
                if !update_module(db, current, node).await?.is_empty() {
                    report.modules.updated += 1;
                }
                id
            }
            None => {
                let created = create_module(db, course_id, node, position).await?;
                report.modules.created += 1;
                created.id
            }
        };
        kept.insert(module_id);
        reconcile_lessons(db, module_id, &node.lessons, &mut report).await?;
    }

    let removed: Vec<i64> = existing.keys().filter(|id| !kept.contains(id)).copied().collect();
    delete_modules(db, &removed, &mut report).await?;
    Ok(report)
}

pub(crate) async fn reconcile_lessons<C: ConnectionTrait>(
    db: &C,
    module_id: i64,
    lessons: &[LessonNode],
    report: &mut ReconcileReport,
) -> AppResult<()> {
    let existing: HashMap<i64, lesson::Model> = lesson::Model::for_module(db, module_id)
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();
    let mut kept = HashSet::new();

    for (position, node) in lessons.iter().enumerate() {
        let lesson_id = match node.id {
            Some(id) => {
                let current = existing
                    .get(&id)
                    .ok_or_else(|| AppError::not_found(format!("Lesson {id} in this module ({})", node.path)))?;
                if !update_lesson(db, current, node).await?.is_empty() {
                    report.lessons.updated += 1;
                }
                id
            }
            None => {
                let created = create_lesson(db, module_id, node, position).await?;
                report.lessons.created += 1;
                created.id
            }
        };
        kept.insert(lesson_id);
        reconcile_activities(db, lesson_id, &node.activities, report).await?;
    }

    let removed: Vec<i64> = existing.keys().filter(|id| !kept.contains(id)).copied().collect();
    delete_lessons(db, &removed, report).await
}

pub(crate) async fn reconcile_activities<C: ConnectionTrait>(
    db: &C,
    lesson_id: i64,
    activities: &[ActivityNode],
    report: &mut ReconcileReport,
) -> AppResult<()> {
    let existing: HashMap<i64, activity::Model> = activity::Model::for_lesson(db, lesson_id)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();
    let mut kept = HashSet::new();

    for node in activities {
        match node.id {
            Some(id) => {
                let current = existing
                    .get(&id)
                    .ok_or_else(|| AppError::not_found(format!("Activity {id} in this lesson ({})", node.path)))?;
                if !update_activity(db, current, node).await?.is_empty() {
                    report.activities.updated += 1;
                }
                kept.insert(id);
            }
            None => {
                let created = create_activity(db, lesson_id, node).await?;
                report.activities.created += 1;
                kept.insert(created.id);
            }
        }
    }

    let removed: Vec<i64> = existing.keys().filter(|id| !kept.contains(id)).copied().collect();
    delete_activities(db, &removed, report).await
}

fn required_title(title: &Option<String>, path: &str) -> AppResult<String> {
    title
        .clone()
        .ok_or_else(|| AppError::validation(format!("{path}.title"), "Title is required"))
}

fn position_order(position: usize) -> i32 {
    i32::try_from(position).unwrap_or(i32::MAX)
}

pub(crate) async fn create_module<C: ConnectionTrait>(
    db: &C,
    course_id: i64,
    node: &ModuleNode,
    position: usize,
) -> AppResult<course_module::Model> {
    let model = course_module::ActiveModel {
        course_id: Set(course_id),
        title: Set(required_title(&node.title, &node.path)?),
        description: Set(node.description.clone().unwrap_or_default()),
        order: Set(node.order.unwrap_or_else(|| position_order(position))),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub(crate) async fn create_lesson<C: ConnectionTrait>(
    db: &C,
    module_id: i64,
    node: &LessonNode,
    position: usize,
) -> AppResult<lesson::Model> {
    let model = lesson::ActiveModel {
        module_id: Set(module_id),
        title: Set(required_title(&node.title, &node.path)?),
        content: Set(node.content.clone().unwrap_or_default()),
        order: Set(node.order.unwrap_or_else(|| position_order(position))),
        has_quiz: Set(node.has_quiz.unwrap_or(false)),
        has_activity: Set(node.has_activity.unwrap_or(false)),
        has_code_sandbox: Set(node.has_code_sandbox.unwrap_or(false)),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub(crate) async fn create_activity<C: ConnectionTrait>(
    db: &C,
    lesson_id: i64,
    node: &ActivityNode,
) -> AppResult<activity::Model> {
    let title = required_title(&node.title, &node.path)?;
    let activity_type = node.activity_type.ok_or_else(|| {
        AppError::validation(format!("{}.activity_type", node.path), "Activity type is required")
    })?;
    let model = activity::ActiveModel {
        lesson_id: Set(lesson_id),
        title: Set(title),
        activity_type: Set(activity_type),
        instructions: Set(node.instructions.clone().unwrap_or_default()),
        max_score: Set(node.max_score.unwrap_or(100)),
        due_date: Set(node.due_date.flatten()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Sets `$field` on `$active` when the submitted value differs from the stored one.
macro_rules! apply_field {
    ($changed:ident, $active:ident, $current:ident, $field:ident, $value:expr) => {
        if let Some(value) = $value {
            if $current.$field != value {
                $active.$field = Set(value);
                $changed.push(stringify!($field));
            }
        }
    };
}

/// Whitelisted in-place update. Returns the names of the fields that changed.
pub async fn update_module<C: ConnectionTrait>(
    db: &C,
    current: &course_module::Model,
    node: &ModuleNode,
) -> AppResult<Vec<&'static str>> {
    let mut changed = Vec::new();
    let mut active: course_module::ActiveModel = current.clone().into();
    apply_field!(changed, active, current, title, node.title.clone());
    apply_field!(changed, active, current, description, node.description.clone());
    apply_field!(changed, active, current, order, node.order);

    if !changed.is_empty() {
        active.update(db).await?;
    }
    Ok(changed)
}

pub async fn update_lesson<C: ConnectionTrait>(
    db: &C,
    current: &lesson::Model,
    node: &LessonNode,
) -> AppResult<Vec<&'static str>> {
    let mut changed = Vec::new();
    let mut active: lesson::ActiveModel = current.clone().into();
    apply_field!(changed, active, current, title, node.title.clone());
    apply_field!(changed, active, current, content, node.content.clone());
    apply_field!(changed, active, current, order, node.order);
    apply_field!(changed, active, current, has_quiz, node.has_quiz);
    apply_field!(changed, active, current, has_activity, node.has_activity);
    apply_field!(changed, active, current, has_code_sandbox, node.has_code_sandbox);

    if !changed.is_empty() {
        active.update(db).await?;
    }
    Ok(changed)
}

pub async fn update_activity<C: ConnectionTrait>(
    db: &C,
    current: &activity::Model,
    node: &ActivityNode,
) -> AppResult<Vec<&'static str>> {
    let mut changed = Vec::new();
    let mut active: activity::ActiveModel = current.clone().into();
    apply_field!(changed, active, current, title, node.title.clone());
    apply_field!(changed, active, current, activity_type, node.activity_type);
    apply_field!(changed, active, current, instructions, node.instructions.clone());
    apply_field!(changed, active, current, max_score, node.max_score);
    apply_field!(changed, active, current, due_date, node.due_date);

    if !changed.is_empty() {
        active.update(db).await?;
    }
    Ok(changed)
}

/// Deletes modules and everything below them.
pub async fn delete_modules<C: ConnectionTrait>(
    db: &C,
    module_ids: &[i64],
    report: &mut ReconcileReport,
) -> AppResult<()> {
    if module_ids.is_empty() {
        return Ok(());
    }
    let lesson_ids: Vec<i64> = lesson::Entity::find()
        .select_only()
        .column(lesson::Column::Id)
        .filter(lesson::Column::ModuleId.is_in(module_ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    delete_lessons(db, &lesson_ids, report).await?;

    let res = course_module::Entity::delete_many()
        .filter(course_module::Column::Id.is_in(module_ids.iter().copied()))
        .exec(db)
        .await?;
    report.modules.deleted += res.rows_affected as usize;
    Ok(())
}

/// Deletes lessons with their activities, submissions and progress rows.
pub async fn delete_lessons<C: ConnectionTrait>(
    db: &C,
    lesson_ids: &[i64],
    report: &mut ReconcileReport,
) -> AppResult<()> {
    if lesson_ids.is_empty() {
        return Ok(());
    }
    let activity_ids: Vec<i64> = activity::Entity::find()
        .select_only()
        .column(activity::Column::Id)
        .filter(activity::Column::LessonId.is_in(lesson_ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    delete_activities(db, &activity_ids, report).await?;

    lesson_progress::Entity::delete_many()
        .filter(lesson_progress::Column::LessonId.is_in(lesson_ids.iter().copied()))
        .exec(db)
        .await?;
    let res = lesson::Entity::delete_many()
        .filter(lesson::Column::Id.is_in(lesson_ids.iter().copied()))
        .exec(db)
        .await?;
    report.lessons.deleted += res.rows_affected as usize;
    Ok(())
}

/// Deletes activities with their submissions, collecting submission files.
pub async fn delete_activities<C: ConnectionTrait>(
    db: &C,
    activity_ids: &[i64],
    report: &mut ReconcileReport,
) -> AppResult<()> {
    if activity_ids.is_empty() {
        return Ok(());
    }
    for file in submission::Model::files_for_activities(db, activity_ids).await? {
        report.orphaned.push(file);
    }
    submission::Entity::delete_many()
        .filter(submission::Column::ActivityId.is_in(activity_ids.iter().copied()))
        .exec(db)
        .await?;
    let res = activity::Entity::delete_many()
        .filter(activity::Column::Id.is_in(activity_ids.iter().copied()))
        .exec(db)
        .await?;
    report.activities.deleted += res.rows_affected as usize;
    Ok(())
}
