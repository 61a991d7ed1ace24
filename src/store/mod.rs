pub mod memory;
pub mod snapshot;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::model::{Board, BoardId, BoardSummary, ListId, TaskFields, TaskId, TaskPatch};

/// The authoritative operations of the board aggregate store.
///
/// Every operation takes the caller's identity; access to a board is the
/// binary owner-or-member capability. Mutating operations return the full
/// updated board document — the server is the source of truth for derived
/// fields such as ids and timestamps — and mutate nothing on error.
pub trait BoardStore {
    fn fetch_board(&self, caller: &str, board_id: &str) -> Result<Board>;
    fn list_boards(&self, caller: &str) -> Result<Vec<BoardSummary>>;
    fn create_board(
        &mut self,
        caller: &str,
        title: &str,
        initial_lists: &[String],
    ) -> Result<Board>;
    fn add_list(&mut self, caller: &str, board_id: &str, title: &str) -> Result<Board>;
    fn reorder_lists(&mut self, caller: &str, board_id: &str, order: &[ListId])
    -> Result<Board>;
    /// Returns a bare acknowledgement; callers wanting the updated document
    /// refetch it.
    fn delete_list(&mut self, caller: &str, board_id: &str, list_id: &str) -> Result<()>;
    fn add_task(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        title: &str,
    ) -> Result<Board>;
    fn update_task(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<Board>;
    fn reorder_tasks(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        order: &[TaskId],
    ) -> Result<Board>;
    fn move_task(
        &mut self,
        caller: &str,
        board_id: &str,
        task_id: &str,
        source_list_id: &str,
        dest_list_id: &str,
    ) -> Result<Board>;
    fn delete_task(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        task_id: &str,
    ) -> Result<Board>;
    fn create_subtask(
        &mut self,
        caller: &str,
        board_id: &str,
        parent_task_id: &str,
        target_list_id: &str,
        fields: &TaskFields,
    ) -> Result<Board>;
    fn add_comment(
        &mut self,
        caller: &str,
        board_id: &str,
        list_id: &str,
        task_id: &str,
        text: &str,
    ) -> Result<Board>;
    fn reorder_boards(&mut self, caller: &str, order: &[BoardId]) -> Result<()>;
    fn delete_board(&mut self, caller: &str, board_id: &str) -> Result<()>;
}
