use std::collections::HashSet;

use chrono::Utc;

use crate::error::{BoardError, Result};
use crate::model::{Board, Comment, List, ListId, Task, TaskFields, TaskId, TaskPatch};
use crate::ops::ordering::{renumber_lists, renumber_tasks};

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// Append a new empty list to the end of the board.
pub fn add_list(board: &mut Board, id: ListId, title: &str) -> Result<()> {
    let title = required_title(title, "list")?;
    let order = board.lists.len();
    board.lists.insert(
        id.clone(),
        List {
            id: id.clone(),
            title,
            order,
            task_ids: Vec::new(),
        },
    );
    board.list_order.push(id);
    board.touch();
    Ok(())
}

/// Delete a list and every task it contains. Tasks in other lists that
/// referenced a deleted task as their parent keep the dangling reference;
/// readers resolve it to "no parent".
pub fn delete_list(board: &mut Board, list_id: &str) -> Result<()> {
    let list = board
        .list(list_id)
        .ok_or_else(|| BoardError::NotFound(format!("list {list_id}")))?;
    let removed: HashSet<TaskId> = list.task_ids.iter().cloned().collect();

    for id in &removed {
        board.tasks.shift_remove(id);
    }
    // Drop forward references to the deleted tasks from surviving parents.
    for task in board.tasks.values_mut() {
        task.subtask_ids.retain(|id| !removed.contains(id));
    }
    board.lists.shift_remove(list_id);
    board.list_order.retain(|id| id != list_id);
    renumber_lists(board);
    board.touch();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Append a new task to the end of a list.
pub fn add_task(board: &mut Board, list_id: &str, id: TaskId, title: &str) -> Result<()> {
    let title = required_title(title, "task")?;
    let list = board
        .list_mut(list_id)
        .ok_or_else(|| BoardError::NotFound(format!("list {list_id}")))?;
    let order = list.task_ids.len();
    list.task_ids.push(id.clone());
    board
        .tasks
        .insert(id.clone(), Task::new(id, TaskFields::titled(title), order));
    board.touch();
    Ok(())
}

/// Apply a partial update to a task's editable fields.
///
/// If the patch sets a due date and the task has a resolvable parent with a
/// due date, the child's date must not be later than the parent's. All
/// checks run before any field is written.
pub fn update_task(
    board: &mut Board,
    list_id: &str,
    task_id: &str,
    patch: &TaskPatch,
) -> Result<()> {
    require_task_in_list(board, list_id, task_id)?;

    let new_title = match &patch.title {
        Some(t) => Some(required_title(t, "task")?),
        None => None,
    };

    let task = board
        .task(task_id)
        .ok_or_else(|| BoardError::NotFound(format!("task {task_id}")))?;
    if let Some(new_due) = patch.due_date
        && let Some(child_due) = new_due
        && let Some(parent) = board.parent_of(task)
        && let Some(parent_due) = parent.due_date
        && child_due > parent_due
    {
        return Err(BoardError::Constraint(format!(
            "due date {child_due} is later than parent task due date {parent_due}"
        )));
    }

    let task = board
        .task_mut(task_id)
        .ok_or_else(|| BoardError::NotFound(format!("task {task_id}")))?;
    if let Some(title) = new_title {
        task.title = title;
    }
    if let Some(description) = &patch.description {
        task.description = description.clone();
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }
    if let Some(labels) = &patch.labels {
        task.labels = labels.clone();
    }
    board.touch();
    Ok(())
}

/// Delete a task from the given list.
///
/// The task's id is removed from its parent's `subtask_ids` (when the
/// parent still resolves), but the task's own subtasks are neither deleted
/// nor rewritten — their back-references dangle.
pub fn delete_task(board: &mut Board, list_id: &str, task_id: &str) -> Result<()> {
    require_task_in_list(board, list_id, task_id)?;

    let list = board
        .list_mut(list_id)
        .ok_or_else(|| BoardError::NotFound(format!("list {list_id}")))?;
    list.task_ids.retain(|id| id != task_id);

    let removed = board.tasks.shift_remove(task_id);
    if let Some(removed) = removed
        && let Some(parent_id) = &removed.parent_task_id
        && let Some(parent) = board.tasks.get_mut(parent_id)
    {
        parent.subtask_ids.retain(|id| id != task_id);
    }

    renumber_tasks(board, list_id);
    board.touch();
    Ok(())
}

/// Append a comment to a task.
pub fn add_comment(
    board: &mut Board,
    list_id: &str,
    task_id: &str,
    author: &str,
    text: &str,
) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BoardError::Validation("comment text is required".into()));
    }
    require_task_in_list(board, list_id, task_id)?;
    let task = board
        .task_mut(task_id)
        .ok_or_else(|| BoardError::NotFound(format!("task {task_id}")))?;
    task.comments.push(Comment {
        text: text.to_string(),
        author: author.to_string(),
        created_at: Utc::now(),
    });
    board.touch();
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Trim a title and reject it when empty.
pub(crate) fn required_title(title: &str, what: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(BoardError::Validation(format!("{what} title is required")));
    }
    Ok(title.to_string())
}

/// The task must exist and be a current member of the stated list.
fn require_task_in_list(board: &Board, list_id: &str, task_id: &str) -> Result<()> {
    let list = board
        .list(list_id)
        .ok_or_else(|| BoardError::NotFound(format!("list {list_id}")))?;
    if !list.task_ids.iter().any(|id| id == task_id) {
        return Err(BoardError::NotFound(format!(
            "task {task_id} in list {list_id}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
