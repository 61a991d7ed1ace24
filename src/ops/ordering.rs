use std::collections::HashSet;

use crate::error::{BoardError, Result};
use crate::model::{Board, ListId, TaskId};

// ---------------------------------------------------------------------------
// Reorders
// ---------------------------------------------------------------------------

/// Reorder the board's lists to the given permutation, assigning
/// `order = index` to each. The id set must exactly match the board's
/// current lists. The whole ordering is replaced, never patched in place.
pub fn reorder_lists(board: &mut Board, new_order: &[ListId]) -> Result<()> {
    if !is_permutation_of(new_order, board.lists.keys().map(|k| k.as_str())) {
        return Err(BoardError::Validation(
            "list order must be a permutation of the board's lists".into(),
        ));
    }
    board.list_order = new_order.to_vec();
    for (idx, id) in new_order.iter().enumerate() {
        if let Some(list) = board.lists.get_mut(id) {
            list.order = idx;
        }
    }
    board.touch();
    Ok(())
}

/// Reorder one list's tasks to the given permutation. Same contract as
/// [`reorder_lists`], scoped to a single list.
pub fn reorder_tasks(board: &mut Board, list_id: &str, new_order: &[TaskId]) -> Result<()> {
    let list = board
        .list_mut(list_id)
        .ok_or_else(|| BoardError::NotFound(format!("list {list_id}")))?;
    if !is_permutation_of(new_order, list.task_ids.iter().map(|t| t.as_str())) {
        return Err(BoardError::Validation(
            "task order must be a permutation of the list's tasks".into(),
        ));
    }
    list.task_ids = new_order.to_vec();
    renumber_tasks(board, list_id);
    board.touch();
    Ok(())
}

// ---------------------------------------------------------------------------
// Cross-list move
// ---------------------------------------------------------------------------

/// Move a task from the source list to the end of the destination list,
/// renumbering both lists densely. The task must currently be a member of
/// the stated source list.
pub fn move_task(
    board: &mut Board,
    task_id: &str,
    source_list_id: &str,
    dest_list_id: &str,
) -> Result<()> {
    if board.task(task_id).is_none() {
        return Err(BoardError::NotFound(format!("task {task_id}")));
    }
    if board.list(dest_list_id).is_none() {
        return Err(BoardError::NotFound(format!("list {dest_list_id}")));
    }
    let source = board
        .list_mut(source_list_id)
        .ok_or_else(|| BoardError::NotFound(format!("list {source_list_id}")))?;
    let idx = source
        .task_ids
        .iter()
        .position(|id| id == task_id)
        .ok_or_else(|| {
            BoardError::NotFound(format!("task {task_id} in list {source_list_id}"))
        })?;
    let moved = source.task_ids.remove(idx);

    // Destination existence was checked up front, so this lookup holds.
    let dest = board
        .list_mut(dest_list_id)
        .ok_or_else(|| BoardError::NotFound(format!("list {dest_list_id}")))?;
    dest.task_ids.push(moved);

    renumber_tasks(board, source_list_id);
    renumber_tasks(board, dest_list_id);
    board.touch();
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rewrite each task's `order` field from its position in the list's id
/// array, restoring the dense `0..n-1` invariant.
pub(crate) fn renumber_tasks(board: &mut Board, list_id: &str) {
    let ids: Vec<TaskId> = match board.list(list_id) {
        Some(list) => list.task_ids.clone(),
        None => return,
    };
    for (idx, id) in ids.iter().enumerate() {
        if let Some(task) = board.task_mut(id) {
            task.order = idx;
        }
    }
}

/// Same as [`renumber_tasks`] for the board's lists.
pub(crate) fn renumber_lists(board: &mut Board) {
    let ids: Vec<ListId> = board.list_order.clone();
    for (idx, id) in ids.iter().enumerate() {
        if let Some(list) = board.list_mut(id) {
            list.order = idx;
        }
    }
}

/// True when `candidate` contains exactly the ids of `current`, each once.
fn is_permutation_of<'a>(
    candidate: &[String],
    current: impl Iterator<Item = &'a str>,
) -> bool {
    let current: HashSet<&str> = current.collect();
    let seen: HashSet<&str> = candidate.iter().map(|s| s.as_str()).collect();
    candidate.len() == current.len() && seen == current
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
