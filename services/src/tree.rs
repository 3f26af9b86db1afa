//! Client-submitted course content tree.
//!
//! The tree arrives as loosely typed JSON (an array, or a JSON-encoded string
//! when posted through a multipart form). It is parsed level by level so that
//! every error can name the node it came from, e.g. `modules[1].lessons[0]`.
//! All structural validation happens here, before anything is written.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use db::models::activity::ActivityType;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{AppError, AppResult};

pub const TITLE_MAX_LEN: usize = 200;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleNode {
    pub path: String,
    pub id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
    pub lessons: Vec<LessonNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonNode {
    pub path: String,
    pub id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<i32>,
    pub has_quiz: Option<bool>,
    pub has_activity: Option<bool>,
    pub has_code_sandbox: Option<bool>,
    pub activities: Vec<ActivityNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityNode {
    pub path: String,
    pub id: Option<i64>,
    pub title: Option<String>,
    pub activity_type: Option<ActivityType>,
    pub instructions: Option<String>,
    pub max_score: Option<i32>,
    /// `Some(None)` clears the due date; `None` leaves it untouched.
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Parses the `modules` payload. `null` means an empty tree.
pub fn parse_modules(raw: &Value) -> AppResult<Vec<ModuleNode>> {
    let decoded;
    let raw = match raw {
        Value::String(s) if s.trim().is_empty() => return Ok(Vec::new()),
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s)
                .map_err(|e| AppError::validation("modules", format!("Invalid JSON: {e}")))?;
            &decoded
        }
        other => other,
    };

    let items = list_of(raw, "modules")?;
    let mut seen = HashSet::new();
    let mut modules = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("modules[{i}]");
        let node = parse_module(item, path)?;
        check_unique(node.id, &node.path, &mut seen)?;
        modules.push(node);
    }
    Ok(modules)
}

/// A single module posted on its own. Nested lessons are parsed as well.
pub fn parse_module_node(value: &Value) -> AppResult<ModuleNode> {
    parse_module(value, "module".to_string())
}

pub fn parse_lesson_node(value: &Value) -> AppResult<LessonNode> {
    parse_lesson(value, "lesson".to_string())
}

pub fn parse_activity_node(value: &Value) -> AppResult<ActivityNode> {
    parse_activity(value, "activity".to_string())
}

/// Whether `key` was sent at all, as opposed to sent empty.
pub fn has_key(value: &Value, key: &str) -> bool {
    value.as_object().is_some_and(|obj| obj.contains_key(key))
}

/// Reads an optional positive id such as `course_id` from a standalone node.
pub fn parent_id(value: &Value, key: &str) -> AppResult<Option<i64>> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_i64() {
            Some(id) if id > 0 => Ok(Some(id)),
            _ => Err(AppError::validation(key, "Must be a positive integer")),
        },
    }
}

fn parse_module(value: &Value, path: String) -> AppResult<ModuleNode> {
    let obj = object(value, &path)?;
    let mut node = ModuleNode {
        id: id_field(obj, &path)?,
        title: title_field(obj, &path)?,
        description: string_field(obj, "description", &path)?,
        order: order_field(obj, &path)?,
        ..Default::default()
    };

    let lessons = obj.get("lessons").unwrap_or(&Value::Null);
    let items = list_of(lessons, &format!("{path}.lessons"))?;
    let mut seen = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        let lesson = parse_lesson(item, format!("{path}.lessons[{i}]"))?;
        check_unique(lesson.id, &lesson.path, &mut seen)?;
        node.lessons.push(lesson);
    }
    node.path = path;
    Ok(node)
}

fn parse_lesson(value: &Value, path: String) -> AppResult<LessonNode> {
    let obj = object(value, &path)?;
    let mut node = LessonNode {
        id: id_field(obj, &path)?,
        title: title_field(obj, &path)?,
        content: string_field(obj, "content", &path)?,
        order: order_field(obj, &path)?,
        has_quiz: bool_field(obj, "has_quiz", &path)?,
        has_activity: bool_field(obj, "has_activity", &path)?,
        has_code_sandbox: bool_field(obj, "has_code_sandbox", &path)?,
        ..Default::default()
    };

    let activities = obj.get("activities").unwrap_or(&Value::Null);
    let items = list_of(activities, &format!("{path}.activities"))?;
    let mut seen = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        let activity = parse_activity(item, format!("{path}.activities[{i}]"))?;
        check_unique(activity.id, &activity.path, &mut seen)?;
        node.activities.push(activity);
    }
    node.path = path;
    Ok(node)
}

fn parse_activity(value: &Value, path: String) -> AppResult<ActivityNode> {
    let obj = object(value, &path)?;

    let activity_type = match obj.get("activity_type") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(ActivityType::from_str(s.trim()).map_err(|_| {
            AppError::validation(
                format!("{path}.activity_type"),
                format!("Unknown activity type '{s}'; expected quiz, sandbox or assignment"),
            )
        })?),
        Some(_) => {
            return Err(AppError::validation(
                format!("{path}.activity_type"),
                "Must be a string",
            ));
        }
    };

    let max_score = match int_field(obj, "max_score", &path)? {
        Some(v) if v < 0 => {
            return Err(AppError::validation(format!("{path}.max_score"), "Must not be negative"));
        }
        v => v,
    };

    let due_date = match obj.get("due_date") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(parse_datetime(s).ok_or_else(|| {
            AppError::validation(format!("{path}.due_date"), "Must be an RFC 3339 timestamp")
        })?)),
        Some(_) => {
            return Err(AppError::validation(format!("{path}.due_date"), "Must be a string"));
        }
    };

    Ok(ActivityNode {
        id: id_field(obj, &path)?,
        title: title_field(obj, &path)?,
        activity_type,
        instructions: string_field(obj, "instructions", &path)?,
        max_score,
        due_date,
        path,
    })
}

/// Accepts RFC 3339, or a naive `YYYY-MM-DDTHH:MM[:SS]` taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn list_of<'a>(value: &'a Value, path: &str) -> AppResult<&'a [Value]> {
    match value {
        Value::Null => Ok(&[]),
        Value::Array(items) => Ok(items),
        _ => Err(AppError::validation(path, "Expected a list")),
    }
}

fn object<'a>(value: &'a Value, path: &str) -> AppResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| AppError::validation(path, "Expected an object"))
}

fn check_unique(id: Option<i64>, path: &str, seen: &mut HashSet<i64>) -> AppResult<()> {
    match id {
        Some(id) if !seen.insert(id) => Err(AppError::validation(
            format!("{path}.id"),
            format!("Duplicate id {id} among siblings"),
        )),
        _ => Ok(()),
    }
}

fn id_field(obj: &Map<String, Value>, path: &str) -> AppResult<Option<i64>> {
    match obj.get("id") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_i64() {
            Some(id) if id > 0 => Ok(Some(id)),
            _ => Err(AppError::validation(format!("{path}.id"), "Must be a positive integer")),
        },
    }
}

fn title_field(obj: &Map<String, Value>, path: &str) -> AppResult<Option<String>> {
    let Some(title) = string_field(obj, "title", path)? else {
        return Ok(None);
    };
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::validation(format!("{path}.title"), "Title must not be blank"));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(AppError::validation(
            format!("{path}.title"),
            format!("Title must be at most {TITLE_MAX_LEN} characters"),
        ));
    }
    Ok(Some(title))
}

fn order_field(obj: &Map<String, Value>, path: &str) -> AppResult<Option<i32>> {
    match int_field(obj, "order", path)? {
        Some(v) if v < 0 => Err(AppError::validation(format!("{path}.order"), "Must not be negative")),
        v => Ok(v),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str, path: &str) -> AppResult<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AppError::validation(format!("{path}.{key}"), "Must be a string")),
    }
}

fn int_field(obj: &Map<String, Value>, key: &str, path: &str) -> AppResult<Option<i32>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("{path}.{key}"), "Must be an integer")),
    }
}

fn bool_field(obj: &Map<String, Value>, key: &str, path: &str) -> AppResult<Option<bool>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(AppError::validation(format!("{path}.{key}"), "Must be a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_of(err: AppError) -> String {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_array() {
        let modules = parse_modules(&json!([
            {"title": "M1", "lessons": [
                {"id": 4, "title": "L1", "order": 2, "activities": [
                    {"title": "A1", "activity_type": "quiz", "due_date": "2030-01-01T10:00:00Z"}
                ]}
            ]}
        ]))
        .unwrap();

        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].path, "modules[0]");
        let lesson = &modules[0].lessons[0];
        assert_eq!(lesson.id, Some(4));
        assert_eq!(lesson.order, Some(2));
        let activity = &lesson.activities[0];
        assert_eq!(activity.path, "modules[0].lessons[0].activities[0]");
        assert_eq!(activity.activity_type, Some(ActivityType::Quiz));
        assert!(matches!(activity.due_date, Some(Some(_))));
    }

    #[test]
    fn accepts_json_encoded_string_and_null() {
        let from_string = parse_modules(&json!(r#"[{"title":"M1"}]"#)).unwrap();
        assert_eq!(from_string[0].title.as_deref(), Some("M1"));
        assert!(from_string[0].lessons.is_empty());

        assert!(parse_modules(&Value::Null).unwrap().is_empty());
        assert!(parse_modules(&json!("")).unwrap().is_empty());
    }

    #[test]
    fn errors_name_the_offending_level() {
        let err = parse_modules(&json!([{"title": "ok"}, {"title": "M2", "lessons": ["nope"]}])).unwrap_err();
        assert_eq!(field_of(err), "modules[1].lessons[0]");

        let err = parse_modules(&json!([{"title": "M", "lessons": {"a": 1}}])).unwrap_err();
        assert_eq!(field_of(err), "modules[0].lessons");

        let err = parse_modules(&json!("{broken")).unwrap_err();
        assert_eq!(field_of(err), "modules");
    }

    #[test]
    fn duplicate_sibling_ids_are_rejected() {
        let err = parse_modules(&json!([{"id": 3, "title": "a"}, {"id": 3, "title": "b"}])).unwrap_err();
        assert_eq!(field_of(err), "modules[1].id");

        // Same id under different parents is a matter for the reconciler, not the parser.
        assert!(parse_modules(&json!([
            {"title": "a", "lessons": [{"id": 1, "title": "x"}]},
            {"title": "b", "lessons": [{"id": 2, "title": "y"}]}
        ]))
        .is_ok());
    }

    #[test]
    fn rejects_unknown_activity_type_and_blank_title() {
        let err = parse_modules(&json!([{"title": "m", "lessons": [{"title": "l", "activities": [
            {"title": "a", "activity_type": "essay"}
        ]}]}]))
        .unwrap_err();
        assert_eq!(field_of(err), "modules[0].lessons[0].activities[0].activity_type");

        let err = parse_modules(&json!([{"title": "   "}])).unwrap_err();
        assert_eq!(field_of(err), "modules[0].title");
    }

    #[test]
    fn due_date_null_clears() {
        let modules = parse_modules(&json!([{"title": "m", "lessons": [{"title": "l", "activities": [
            {"id": 1, "due_date": null}, {"id": 2}
        ]}]}]))
        .unwrap();
        let acts = &modules[0].lessons[0].activities;
        assert_eq!(acts[0].due_date, Some(None));
        assert_eq!(acts[1].due_date, None);
    }

    #[test]
    fn naive_datetimes_are_utc() {
        let dt = parse_datetime("2030-05-01T08:30").unwrap();
        assert_eq!(dt.to_rfc3339(), "2030-05-01T08:30:00+00:00");
        assert!(parse_datetime("tomorrow").is_none());
    }
}
