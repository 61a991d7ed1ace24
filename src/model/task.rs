use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::board::{TaskId, UserId};

/// A colored label on a task. The text may be empty (color-only label).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub color: String,
    #[serde(default)]
    pub text: String,
}

/// A comment on a task, owned exclusively by that task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
}

/// A unit of work. Belongs to exactly one list at any instant; its position
/// within that list is `order` (dense, zero-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Due date, day precision.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Position within the owning list.
    pub order: usize,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Back-reference to a parent task. May dangle after the parent is
    /// deleted; readers must treat an unresolvable reference as "no parent".
    #[serde(default)]
    pub parent_task_id: Option<TaskId>,
    /// Forward references to linked subtasks.
    #[serde(default)]
    pub subtask_ids: Vec<TaskId>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task with the given fields at the given position.
    pub fn new(id: TaskId, fields: TaskFields, order: usize) -> Self {
        Task {
            id,
            title: fields.title,
            description: fields.description,
            due_date: fields.due_date,
            order,
            labels: fields.labels,
            parent_task_id: None,
            subtask_ids: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// The user-editable fields of a task, as one value. Used for task
/// creation, draft subtasks, and navigation snapshots of unsaved edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFields {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl TaskFields {
    pub fn titled(title: impl Into<String>) -> Self {
        TaskFields {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A partial update to a task. `None` leaves the field untouched;
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub labels: Option<Vec<Label>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.labels.is_none()
    }
}
