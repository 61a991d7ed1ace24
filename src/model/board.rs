use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::task::Task;

pub type BoardId = String;
pub type ListId = String;
pub type TaskId = String;
pub type UserId = String;

/// A member's role on a board. Recorded but not differentially enforced:
/// access is the binary owner-or-member capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

/// A user granted access to a board (access, not ownership).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub role: Role,
}

/// An ordered column of tasks within a board. Holds task ids only; the
/// tasks themselves live in the board's normalized task map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub title: String,
    /// Position within the board.
    pub order: usize,
    /// Member tasks, in display order. Mirrors each task's `order` field.
    pub task_ids: Vec<TaskId>,
}

/// The board aggregate: the single unit of persistence.
///
/// Storage is normalized — lists and tasks live in id-keyed maps, with
/// `list_order` and per-list `task_ids` carrying the positions — so moves
/// and reorders are index-array rewrites rather than deep copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    pub owner: UserId,
    #[serde(default)]
    pub members: Vec<Member>,
    /// List ids in display order. Mirrors each list's `order` field.
    #[serde(default)]
    pub list_order: Vec<ListId>,
    #[serde(default)]
    pub lists: IndexMap<ListId, List>,
    #[serde(default)]
    pub tasks: IndexMap<TaskId, Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A lightweight board row for dashboard listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: BoardId,
    pub title: String,
    pub owner: UserId,
    pub list_count: usize,
}

impl Board {
    pub fn new(id: BoardId, title: String, owner: UserId) -> Self {
        let now = Utc::now();
        Board {
            id,
            title,
            owner,
            members: Vec::new(),
            list_order: Vec::new(),
            lists: IndexMap::new(),
            tasks: IndexMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user` may read and mutate this board (owner or member).
    pub fn has_access(&self, user: &str) -> bool {
        self.owner == user || self.members.iter().any(|m| m.user_id == user)
    }

    pub fn list(&self, list_id: &str) -> Option<&List> {
        self.lists.get(list_id)
    }

    pub fn list_mut(&mut self, list_id: &str) -> Option<&mut List> {
        self.lists.get_mut(list_id)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.get_mut(task_id)
    }

    /// Lists in display order.
    pub fn ordered_lists(&self) -> impl Iterator<Item = &List> {
        self.list_order.iter().filter_map(|id| self.lists.get(id))
    }

    /// Tasks of one list in display order.
    pub fn ordered_tasks(&self, list_id: &str) -> Vec<&Task> {
        self.lists
            .get(list_id)
            .map(|list| {
                list.task_ids
                    .iter()
                    .filter_map(|id| self.tasks.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The list currently containing `task_id`, if any.
    pub fn list_of_task(&self, task_id: &str) -> Option<&List> {
        self.lists
            .values()
            .find(|list| list.task_ids.iter().any(|id| id == task_id))
    }

    /// Resolve a task's parent. A dangling `parent_task_id` (parent was
    /// deleted) reads as "no parent".
    pub fn parent_of(&self, task: &Task) -> Option<&Task> {
        task.parent_task_id
            .as_deref()
            .and_then(|id| self.tasks.get(id))
    }

    /// Resolve a task's subtasks, skipping any ids that no longer resolve.
    pub fn subtasks_of(&self, task: &Task) -> Vec<&Task> {
        task.subtask_ids
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .collect()
    }

    /// Total task count across all lists.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn summary(&self) -> BoardSummary {
        BoardSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            owner: self.owner.clone(),
            list_count: self.lists.len(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskFields;

    fn board_with_task() -> Board {
        let mut board = Board::new("board-1".into(), "Demo".into(), "alice".into());
        board.list_order.push("list-1".into());
        board.lists.insert(
            "list-1".into(),
            List {
                id: "list-1".into(),
                title: "Todo".into(),
                order: 0,
                task_ids: vec!["task-1".into()],
            },
        );
        board.tasks.insert(
            "task-1".into(),
            Task::new("task-1".into(), TaskFields::titled("First"), 0),
        );
        board
    }

    #[test]
    fn access_owner_and_member() {
        let mut board = board_with_task();
        board.members.push(Member {
            user_id: "bob".into(),
            role: Role::Editor,
        });
        assert!(board.has_access("alice"));
        assert!(board.has_access("bob"));
        assert!(!board.has_access("mallory"));
    }

    #[test]
    fn list_of_task_resolves_owning_list() {
        let board = board_with_task();
        assert_eq!(board.list_of_task("task-1").unwrap().id, "list-1");
        assert!(board.list_of_task("task-99").is_none());
    }

    #[test]
    fn dangling_parent_reads_as_no_parent() {
        let mut board = board_with_task();
        let task = board.task_mut("task-1").unwrap();
        task.parent_task_id = Some("task-deleted".into());
        let task = board.task("task-1").unwrap();
        assert!(board.parent_of(task).is_none());
    }

    #[test]
    fn subtasks_skip_unresolvable_ids() {
        let mut board = board_with_task();
        let task = board.task_mut("task-1").unwrap();
        task.subtask_ids = vec!["task-gone".into()];
        let task = board.task("task-1").unwrap();
        assert!(board.subtasks_of(task).is_empty());
    }
}
