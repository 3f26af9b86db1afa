//! Standalone CRUD for modules, lessons and activities.
//!
//! Bodies are parsed with the same node parser as the course tree. A body
//! that carries a nested list (`lessons` on a module, `activities` on a
//! lesson) also reconciles that list; omitting the key leaves children alone.
//! Nodes never move to a different parent.

use db::models::{activity, course, course_module, lesson};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde_json::Value;
use util::storage::FileStore;

use crate::error::{AppError, AppResult};
use crate::gate::{self, Action, Actor, Resource};
use crate::reconciler::{self, ReconcileReport};
use crate::tree;

pub struct ContentService;

fn require(actor: Option<&Actor>, action: Action, resource: Resource) -> AppResult<&Actor> {
    match actor {
        Some(a) if gate::can(Some(a), action, resource) => Ok(a),
        _ => Err(AppError::PermissionDenied),
    }
}

fn reject_reparent(body: &Value, key: &str, current: i64) -> AppResult<()> {
    match tree::parent_id(body, key)? {
        Some(id) if id != current => Err(AppError::validation(key, "Cannot move to a different parent")),
        _ => Ok(()),
    }
}

fn position(count: u64) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX)
}

impl ContentService {
    pub async fn list_modules(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        course_id: Option<i64>,
    ) -> AppResult<Vec<course_module::Model>> {
        require(actor, Action::List, Resource::Module)?;
        let mut query = course_module::Entity::find()
            .order_by_asc(course_module::Column::CourseId)
            .order_by_asc(course_module::Column::Order)
            .order_by_asc(course_module::Column::Id);
        if let Some(id) = course_id {
            query = query.filter(course_module::Column::CourseId.eq(id));
        }
        Ok(query.all(db).await?)
    }

    pub async fn get_module(db: &DatabaseConnection, actor: Option<&Actor>, id: i64) -> AppResult<course_module::Model> {
        require(actor, Action::Retrieve, Resource::Module)?;
        find_module(db, id).await
    }

    pub async fn create_module(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        body: &Value,
    ) -> AppResult<course_module::Model> {
        require(actor, Action::Create, Resource::Module)?;
        let course_id = tree::parent_id(body, "course_id")?
            .ok_or_else(|| AppError::validation("course_id", "Course is required"))?;
        let mut node = tree::parse_module_node(body)?;
        node.id = None;

        let txn = db.begin().await?;
        course::Entity::find_by_id(course_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Course"))?;
        let siblings = course_module::Entity::find()
            .filter(course_module::Column::CourseId.eq(course_id))
            .count(&txn)
            .await?;
        let created = reconciler::create_module(&txn, course_id, &node, position(siblings)).await?;

        let mut report = ReconcileReport::default();
        if tree::has_key(body, "lessons") {
            reconciler::reconcile_lessons(&txn, created.id, &node.lessons, &mut report).await?;
        }
        txn.commit().await?;

        tracing::info!(module_id = created.id, course_id, "Module created");
        Ok(created)
    }

    pub async fn update_module(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: Option<&Actor>,
        id: i64,
        body: &Value,
    ) -> AppResult<course_module::Model> {
        require(actor, Action::Update, Resource::Module)?;
        let node = tree::parse_module_node(body)?;

        let txn = db.begin().await?;
        let current = find_module(&txn, id).await?;
        reject_reparent(body, "course_id", current.course_id)?;

        let changed = reconciler::update_module(&txn, &current, &node).await?;
        let mut report = ReconcileReport::default();
        if tree::has_key(body, "lessons") {
            reconciler::reconcile_lessons(&txn, id, &node.lessons, &mut report).await?;
        }
        let updated = find_module(&txn, id).await?;
        txn.commit().await?;

        storage.cleanup(report.orphaned).await;
        tracing::info!(module_id = id, fields = ?changed, lessons = ?report.lessons, "Module updated");
        Ok(updated)
    }

    pub async fn delete_module(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: Option<&Actor>,
        id: i64,
    ) -> AppResult<()> {
        require(actor, Action::Delete, Resource::Module)?;

        let txn = db.begin().await?;
        find_module(&txn, id).await?;
        let mut report = ReconcileReport::default();
        reconciler::delete_modules(&txn, &[id], &mut report).await?;
        txn.commit().await?;

        storage.cleanup(report.orphaned).await;
        tracing::info!(
            module_id = id,
            lessons = report.lessons.deleted,
            activities = report.activities.deleted,
            "Module deleted"
        );
        Ok(())
    }

    pub async fn list_lessons(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        module_id: Option<i64>,
    ) -> AppResult<Vec<lesson::Model>> {
        require(actor, Action::List, Resource::Lesson)?;
        let mut query = lesson::Entity::find()
            .order_by_asc(lesson::Column::ModuleId)
            .order_by_asc(lesson::Column::Order)
            .order_by_asc(lesson::Column::Id);
        if let Some(id) = module_id {
            query = query.filter(lesson::Column::ModuleId.eq(id));
        }
        Ok(query.all(db).await?)
    }

    pub async fn get_lesson(db: &DatabaseConnection, actor: Option<&Actor>, id: i64) -> AppResult<lesson::Model> {
        require(actor, Action::Retrieve, Resource::Lesson)?;
        find_lesson(db, id).await
    }

    pub async fn create_lesson(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        body: &Value,
    ) -> AppResult<lesson::Model> {
        require(actor, Action::Create, Resource::Lesson)?;
        let module_id = tree::parent_id(body, "module_id")?
            .ok_or_else(|| AppError::validation("module_id", "Module is required"))?;
        let mut node = tree::parse_lesson_node(body)?;
        node.id = None;

        let txn = db.begin().await?;
        find_module(&txn, module_id).await?;
        let siblings = lesson::Entity::find()
            .filter(lesson::Column::ModuleId.eq(module_id))
            .count(&txn)
            .await?;
        let created = reconciler::create_lesson(&txn, module_id, &node, position(siblings)).await?;

        let mut report = ReconcileReport::default();
        if tree::has_key(body, "activities") {
            reconciler::reconcile_activities(&txn, created.id, &node.activities, &mut report).await?;
        }
        txn.commit().await?;

        tracing::info!(lesson_id = created.id, module_id, "Lesson created");
        Ok(created)
    }

    pub async fn update_lesson(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: Option<&Actor>,
        id: i64,
        body: &Value,
    ) -> AppResult<lesson::Model> {
        require(actor, Action::Update, Resource::Lesson)?;
        let node = tree::parse_lesson_node(body)?;

        let txn = db.begin().await?;
        let current = find_lesson(&txn, id).await?;
        reject_reparent(body, "module_id", current.module_id)?;

        let changed = reconciler::update_lesson(&txn, &current, &node).await?;
        let mut report = ReconcileReport::default();
        if tree::has_key(body, "activities") {
            reconciler::reconcile_activities(&txn, id, &node.activities, &mut report).await?;
        }
        let updated = find_lesson(&txn, id).await?;
        txn.commit().await?;

        storage.cleanup(report.orphaned).await;
        tracing::info!(lesson_id = id, fields = ?changed, activities = ?report.activities, "Lesson updated");
        Ok(updated)
    }

    pub async fn delete_lesson(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: Option<&Actor>,
        id: i64,
    ) -> AppResult<()> {
        require(actor, Action::Delete, Resource::Lesson)?;

        let txn = db.begin().await?;
        find_lesson(&txn, id).await?;
        let mut report = ReconcileReport::default();
        reconciler::delete_lessons(&txn, &[id], &mut report).await?;
        txn.commit().await?;

        storage.cleanup(report.orphaned).await;
        tracing::info!(lesson_id = id, activities = report.activities.deleted, "Lesson deleted");
        Ok(())
    }

    pub async fn list_activities(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        lesson_id: Option<i64>,
    ) -> AppResult<Vec<activity::Model>> {
        require(actor, Action::List, Resource::Activity)?;
        let mut query = activity::Entity::find().order_by_asc(activity::Column::Id);
        if let Some(id) = lesson_id {
            query = query.filter(activity::Column::LessonId.eq(id));
        }
        Ok(query.all(db).await?)
    }

    pub async fn get_activity(db: &DatabaseConnection, actor: Option<&Actor>, id: i64) -> AppResult<activity::Model> {
        require(actor, Action::Retrieve, Resource::Activity)?;
        find_activity(db, id).await
    }

    pub async fn create_activity(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        body: &Value,
    ) -> AppResult<activity::Model> {
        require(actor, Action::Create, Resource::Activity)?;
        let lesson_id = tree::parent_id(body, "lesson_id")?
            .ok_or_else(|| AppError::validation("lesson_id", "Lesson is required"))?;
        let mut node = tree::parse_activity_node(body)?;
        node.id = None;

        find_lesson(db, lesson_id).await?;
        let created = reconciler::create_activity(db, lesson_id, &node).await?;
        tracing::info!(activity_id = created.id, lesson_id, "Activity created");
        Ok(created)
    }

    pub async fn update_activity(
        db: &DatabaseConnection,
        actor: Option<&Actor>,
        id: i64,
        body: &Value,
    ) -> AppResult<activity::Model> {
        require(actor, Action::Update, Resource::Activity)?;
        let node = tree::parse_activity_node(body)?;

        let current = find_activity(db, id).await?;
        reject_reparent(body, "lesson_id", current.lesson_id)?;
        let changed = reconciler::update_activity(db, &current, &node).await?;
        tracing::info!(activity_id = id, fields = ?changed, "Activity updated");
        find_activity(db, id).await
    }

    pub async fn delete_activity(
        db: &DatabaseConnection,
        storage: &FileStore,
        actor: Option<&Actor>,
        id: i64,
    ) -> AppResult<()> {
        require(actor, Action::Delete, Resource::Activity)?;

        let txn = db.begin().await?;
        find_activity(&txn, id).await?;
        let mut report = ReconcileReport::default();
        reconciler::delete_activities(&txn, &[id], &mut report).await?;
        txn.commit().await?;

        storage.cleanup(report.orphaned).await;
        tracing::info!(activity_id = id, "Activity deleted");
        Ok(())
    }
}

async fn find_module<C: sea_orm::ConnectionTrait>(db: &C, id: i64) -> AppResult<course_module::Model> {
    course_module::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Module"))
}

async fn find_lesson<C: sea_orm::ConnectionTrait>(db: &C, id: i64) -> AppResult<lesson::Model> {
    lesson::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Lesson"))
}

async fn find_activity<C: sea_orm::ConnectionTrait>(db: &C, id: i64) -> AppResult<activity::Model> {
    activity::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found("Activity"))
}
