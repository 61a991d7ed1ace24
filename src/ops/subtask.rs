use std::collections::HashSet;

use crate::error::{BoardError, Result};
use crate::model::{Board, Task, TaskFields, TaskId};
use crate::ops::board_ops::required_title;

/// Create a new task in `target_list_id` linked as a subtask of
/// `parent_task_id`.
///
/// A subtask is an ordinary task that lives in some list and carries a
/// back-reference — linking is not structural containment. The hierarchy is
/// capped at depth 2: only a task with no (resolvable) parent may be given
/// subtasks.
pub fn create_linked_subtask(
    board: &mut Board,
    new_id: TaskId,
    parent_task_id: &str,
    target_list_id: &str,
    fields: TaskFields,
) -> Result<TaskId> {
    let title = required_title(&fields.title, "task")?;

    let parent = board
        .task(parent_task_id)
        .ok_or_else(|| BoardError::NotFound(format!("task {parent_task_id}")))?;
    if board.list(target_list_id).is_none() {
        return Err(BoardError::Validation(format!(
            "list {target_list_id} does not belong to this board"
        )));
    }
    if board.parent_of(parent).is_some() {
        return Err(BoardError::Validation(
            "a subtask cannot be given subtasks of its own".into(),
        ));
    }
    if link_would_cycle(board, parent_task_id, &new_id) {
        return Err(BoardError::Constraint(
            "linking would create a cycle in the parent chain".into(),
        ));
    }
    if let Some(child_due) = fields.due_date
        && let Some(parent_due) = parent.due_date
        && child_due > parent_due
    {
        return Err(BoardError::Constraint(format!(
            "due date {child_due} is later than parent task due date {parent_due}"
        )));
    }

    let list = board
        .list_mut(target_list_id)
        .ok_or_else(|| BoardError::NotFound(format!("list {target_list_id}")))?;
    let order = list.task_ids.len();
    list.task_ids.push(new_id.clone());

    let mut task = Task::new(new_id.clone(), fields, order);
    task.title = title;
    task.parent_task_id = Some(parent_task_id.to_string());
    board.tasks.insert(new_id.clone(), task);

    let parent = board
        .task_mut(parent_task_id)
        .ok_or_else(|| BoardError::NotFound(format!("task {parent_task_id}")))?;
    parent.subtask_ids.push(new_id.clone());
    board.touch();
    Ok(new_id)
}

/// Whether linking `child_id` under `parent_id` would make `child_id`
/// reachable from itself. Walks the parent chain upward from `parent_id`
/// with a visited set, so a malformed chain cannot loop forever.
pub fn link_would_cycle(board: &Board, parent_id: &str, child_id: &str) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = Some(parent_id);
    while let Some(id) = current {
        if id == child_id {
            return true;
        }
        if !visited.insert(id) {
            // Pre-existing cycle above the parent; the new link is not at fault.
            return false;
        }
        current = board
            .task(id)
            .and_then(|task| task.parent_task_id.as_deref());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::board_ops::{add_list, add_task};
    use chrono::NaiveDate;

    fn sample_board() -> Board {
        let mut board = Board::new("board-1".into(), "Demo".into(), "alice".into());
        add_list(&mut board, "list-a".into(), "Todo").unwrap();
        add_list(&mut board, "list-b".into(), "Doing").unwrap();
        add_task(&mut board, "list-a", "t1".into(), "Parent").unwrap();
        board
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn links_both_directions_and_appends_to_target_list() {
        let mut board = sample_board();
        let id = create_linked_subtask(
            &mut board,
            "sub1".into(),
            "t1",
            "list-b",
            TaskFields::titled("Child"),
        )
        .unwrap();
        assert_eq!(id, "sub1");

        let child = board.task("sub1").unwrap();
        assert_eq!(child.parent_task_id.as_deref(), Some("t1"));
        assert_eq!(child.order, 0);
        assert_eq!(board.list_of_task("sub1").unwrap().id, "list-b");
        assert_eq!(board.task("t1").unwrap().subtask_ids, vec!["sub1"]);
    }

    #[test]
    fn unknown_parent_is_not_found() {
        let mut board = sample_board();
        let result = create_linked_subtask(
            &mut board,
            "sub1".into(),
            "t-none",
            "list-b",
            TaskFields::titled("Child"),
        );
        assert!(matches!(result, Err(BoardError::NotFound(_))));
    }

    #[test]
    fn foreign_target_list_is_validation() {
        let mut board = sample_board();
        let before = board.clone();
        let result = create_linked_subtask(
            &mut board,
            "sub1".into(),
            "t1",
            "list-elsewhere",
            TaskFields::titled("Child"),
        );
        assert!(matches!(result, Err(BoardError::Validation(_))));
        assert_eq!(board, before);
    }

    #[test]
    fn depth_is_capped_at_two() {
        let mut board = sample_board();
        create_linked_subtask(
            &mut board,
            "sub1".into(),
            "t1",
            "list-b",
            TaskFields::titled("Child"),
        )
        .unwrap();

        // A subtask cannot itself become a parent
        let result = create_linked_subtask(
            &mut board,
            "sub2".into(),
            "sub1",
            "list-b",
            TaskFields::titled("Grandchild"),
        );
        assert!(matches!(result, Err(BoardError::Validation(_))));
    }

    #[test]
    fn dangling_parent_reference_does_not_block_linking() {
        let mut board = sample_board();
        // t1 claims a parent that no longer exists; for reads that is "no
        // parent", so t1 may still be given subtasks.
        board.task_mut("t1").unwrap().parent_task_id = Some("t-deleted".into());
        create_linked_subtask(
            &mut board,
            "sub1".into(),
            "t1",
            "list-b",
            TaskFields::titled("Child"),
        )
        .unwrap();
        assert_eq!(board.task("t1").unwrap().subtask_ids, vec!["sub1"]);
    }

    #[test]
    fn self_link_is_a_cycle() {
        let board = sample_board();
        assert!(link_would_cycle(&board, "t1", "t1"));
    }

    #[test]
    fn cycle_walk_follows_parent_chain() {
        let mut board = sample_board();
        add_task(&mut board, "list-a", "t2".into(), "Middle").unwrap();
        board.task_mut("t2").unwrap().parent_task_id = Some("t1".into());

        // t1 is above t2, so inserting t1 below t2 would close a cycle
        assert!(link_would_cycle(&board, "t2", "t1"));
        assert!(!link_would_cycle(&board, "t2", "t3"));
    }

    #[test]
    fn cycle_walk_terminates_on_malformed_chain() {
        let mut board = sample_board();
        add_task(&mut board, "list-a", "t2".into(), "Looped").unwrap();
        board.task_mut("t1").unwrap().parent_task_id = Some("t2".into());
        board.task_mut("t2").unwrap().parent_task_id = Some("t1".into());

        assert!(!link_would_cycle(&board, "t1", "t9"));
    }

    #[test]
    fn child_due_date_past_parent_is_constraint() {
        let mut board = sample_board();
        board.task_mut("t1").unwrap().due_date = Some(date("2026-09-10"));

        let mut fields = TaskFields::titled("Child");
        fields.due_date = Some(date("2026-09-11"));
        let result = create_linked_subtask(&mut board, "sub1".into(), "t1", "list-b", fields);
        assert!(matches!(result, Err(BoardError::Constraint(_))));
        assert!(board.task("sub1").is_none());

        // Equal dates are allowed
        let mut fields = TaskFields::titled("Child");
        fields.due_date = Some(date("2026-09-10"));
        create_linked_subtask(&mut board, "sub1".into(), "t1", "list-b", fields).unwrap();
    }

    #[test]
    fn due_date_unchecked_when_either_side_is_absent() {
        let mut board = sample_board();
        let mut fields = TaskFields::titled("Child");
        fields.due_date = Some(date("2030-01-01"));
        // Parent has no due date: any child date is fine
        create_linked_subtask(&mut board, "sub1".into(), "t1", "list-b", fields).unwrap();
    }
}
