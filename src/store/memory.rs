use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::model::{Board, BoardId, BoardSummary, ListId, TaskFields, TaskId, TaskPatch, UserId};
use crate::ops::board_ops::{self, required_title};
use crate::ops::{ordering, subtask};
use crate::store::BoardStore;

/// In-memory reference implementation of the board aggregate store.
///
/// Each request runs to completion against the owned document map, which
/// gives the per-document serialization the protocol assumes. The whole
/// store serializes as one opaque JSON document (see `snapshot`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    boards: IndexMap<BoardId, Board>,
    /// Per-user dashboard ordering, written by `reorder_boards`.
    #[serde(default)]
    board_ranks: IndexMap<UserId, Vec<BoardId>>,
    #[serde(default)]
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn board(&self, caller: &str, board_id: &str) -> Result<&Board> {
        let board = self
            .boards
            .get(board_id)
            .ok_or_else(|| BoardError::NotFound(format!("board {board_id}")))?;
        if !board.has_access(caller) {
            return Err(BoardError::Authorization(format!("board {board_id}")));
        }
        Ok(board)
    }

    fn board_mut(&mut self, caller: &str, board_id: &str) -> Result<&mut Board> {
        let board = self
            .boards
            .get_mut(board_id)
            .ok_or_else(|| BoardError::NotFound(format!("board {board_id}")))?;
        if !board.has_access(caller) {
            return Err(BoardError::Authorization(format!("board {board_id}")));
        }
        Ok(board)
    }

    /// Direct access for test setup (e.g. granting membership).
    pub fn board_unchecked_mut(&mut self, board_id: &str) -> Option<&mut Board> {
        self.boards.get_mut(board_id)
    }
}

impl BoardStore for MemoryStore {
    fn fetch_board(&self, caller: &str, board_id: &str) -> Result<Board> {
        self.board(caller, board_id).cloned()
    }

    fn list_boards(&self, caller: &str) -> Result<Vec<BoardSummary>> {
        let mut accessible: Vec<&Board> = self
            .boards
            .values()
            .filter(|b| b.has_access(caller))
            .collect();
        // Caller's stored preference first, insertion order for the rest.
        if let Some(ranks) = self.board_ranks.get(caller) {
            let rank_of = |id: &str| ranks.iter().position(|r| r == id).unwrap_or(usize::MAX);
            accessible.sort_by_key(|b| rank_of(&b.id));
        }
        Ok(accessible.iter().map(|b| b.summary()).collect())
    }

    fn create_board(
        &mut self,
        caller: &str,
        title: &str,
        initial_lists: &[String],
    ) -> Result<Board> {
        let title = required_title(title, "board")?;
        for list_title in initial_lists {
            required_title(list_title, "list")?;
        }

        let board_id = self.fresh_id("board");
        let mut board = Board::new(board_id.clone(), title, caller.to_string());
        for list_title in initial_lists {
            let list_id = self.fresh_id("list");
            board_ops::add_list(&mut board, list_id, list_title)?;
        }
        self.boards.insert(board_id, board.clone());
        Ok(board)
    }

    fn add_list(&mut self, caller: &str, board_id: &str, title: &str) -> Result<Board> {
        let list_id = self.fresh_id("list");
        let board = self.board_mut(caller, board_id)?;
        board_ops::add_list(board, list_id, title)?;
        Ok(board.clone())
    }

    fn reorder_lists(
        &mut self,
        caller: &str,
        board_id: &str,
        order: &[ListId],
    ) -> Result<Board> {
        let board = self.board_mut(caller, board_id)?;
        ordering::reorder_lists(board, order)?;
        Ok(board.clone())
    }

    fn delete_list(&mut self, caller: &str, board_id: &str, list_id: &str) -> Result<()> {
        let board = self.board_mut(caller, board_id)?;
        board_ops::delete_list(board, list_id)
    }

    fn add_task(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        title: &str,
    ) -> Result<Board> {
        let task_id = self.fresh_id("task");
        let board = self.board_mut(caller, board_id)?;
        board_ops::add_task(board, list_id, task_id, title)?;
        Ok(board.clone())
    }

    fn update_task(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<Board> {
        let board = self.board_mut(caller, board_id)?;
        board_ops::update_task(board, list_id, task_id, patch)?;
        Ok(board.clone())
    }

    fn reorder_tasks(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        order: &[TaskId],
    ) -> Result<Board> {
        let board = self.board_mut(caller, board_id)?;
        ordering::reorder_tasks(board, list_id, order)?;
        Ok(board.clone())
    }

    fn move_task(
        &mut self,
        caller: &str,
        board_id: &str,
        task_id: &str,
        source_list_id: &str,
        dest_list_id: &str,
    ) -> Result<Board> {
        let board = self.board_mut(caller, board_id)?;
        ordering::move_task(board, task_id, source_list_id, dest_list_id)?;
        Ok(board.clone())
    }

    fn delete_task(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        task_id: &str,
    ) -> Result<Board> {
        let board = self.board_mut(caller, board_id)?;
        board_ops::delete_task(board, list_id, task_id)?;
        Ok(board.clone())
    }

    fn create_subtask(
        &mut self,
        caller: &str,
        board_id: &str,
        parent_task_id: &str,
        target_list_id: &str,
        fields: &TaskFields,
    ) -> Result<Board> {
        let task_id = self.fresh_id("task");
        let board = self.board_mut(caller, board_id)?;
        subtask::create_linked_subtask(
            board,
            task_id,
            parent_task_id,
            target_list_id,
            fields.clone(),
        )?;
        Ok(board.clone())
    }

    fn add_comment(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        task_id: &str,
        text: &str,
    ) -> Result<Board> {
        let author = caller.to_string();
        let board = self.board_mut(caller, board_id)?;
        board_ops::add_comment(board, list_id, task_id, &author, text)?;
        Ok(board.clone())
    }

    fn reorder_boards(&mut self, caller: &str, order: &[BoardId]) -> Result<()> {
        self.board_ranks.insert(caller.to_string(), order.to_vec());
        Ok(())
    }

    fn delete_board(&mut self, caller: &str, board_id: &str) -> Result<()> {
        self.board(caller, board_id)?;
        self.boards.shift_remove(board_id);
        Ok(())
    }
}
