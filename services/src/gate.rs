//! Role capability checks.
//!
//! Everything here is pure: the caller resolves the actor from the request
//! and asks [`can`] before touching the database. Course reads are narrowed
//! with [`course_scope`].

use db::models::user::Role;

/// Authenticated principal performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Delete,
    Approve,
    Reject,
    SubmitForReview,
    Enroll,
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Course,
    Module,
    Lesson,
    Activity,
    Submission,
    Certificate,
    Progress,
    Dashboard(Role),
    Profile,
}

/// Which courses an actor may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseScope {
    None,
    All,
    CreatedBy(i64),
    Approved,
}

pub fn can(actor: Option<&Actor>, action: Action, resource: Resource) -> bool {
    let Some(actor) = actor else {
        return false;
    };

    match resource {
        Resource::Course => course_capability(actor.role, action),
        Resource::Dashboard(owner) => action == Action::View && actor.role == owner,
        Resource::Certificate => matches!(action, Action::List | Action::Retrieve),
        Resource::Module
        | Resource::Lesson
        | Resource::Activity
        | Resource::Submission
        | Resource::Progress
        | Resource::Profile => true,
    }
}

fn course_capability(role: Role, action: Action) -> bool {
    match action {
        Action::List | Action::Retrieve => true,
        Action::Create
        | Action::Update
        | Action::PartialUpdate
        | Action::Delete
        | Action::SubmitForReview => match role {
            Role::Instructor => true,
            Role::Admin | Role::Student => false,
        },
        Action::Approve | Action::Reject => match role {
            Role::Admin => true,
            Role::Instructor | Role::Student => false,
        },
        Action::Enroll => match role {
            Role::Student => true,
            Role::Admin | Role::Instructor => false,
        },
        Action::View => false,
    }
}

pub fn course_scope(actor: Option<&Actor>) -> CourseScope {
    match actor {
        None => CourseScope::None,
        Some(a) => match a.role {
            Role::Admin => CourseScope::All,
            Role::Instructor => CourseScope::CreatedBy(a.id),
            Role::Student => CourseScope::Approved,
        },
    }
}

impl CourseScope {
    /// Whether a course with the given creator and approval flag is visible.
    pub fn admits(&self, creator_id: i64, is_approved: bool) -> bool {
        match self {
            CourseScope::None => false,
            CourseScope::All => true,
            CourseScope::CreatedBy(id) => *id == creator_id,
            CourseScope::Approved => is_approved,
        }
    }
}
