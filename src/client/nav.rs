use serde::{Deserialize, Serialize};

use crate::model::{ListId, TaskFields};

const NAV_STACK_LIMIT: usize = 100;

/// One entry of task-view history: the task that was open before the user
/// drilled into a linked parent or subtask.
///
/// A frame for a virtual or draft task carries a snapshot of its
/// in-progress fields, so returning to it does not lose unsaved edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavFrame {
    pub task_id: String,
    pub list_id: ListId,
    #[serde(default)]
    pub snapshot: Option<TaskFields>,
}

impl NavFrame {
    pub fn saved(task_id: impl Into<String>, list_id: impl Into<ListId>) -> Self {
        NavFrame {
            task_id: task_id.into(),
            list_id: list_id.into(),
            snapshot: None,
        }
    }

    pub fn draft(
        task_id: impl Into<String>,
        list_id: impl Into<ListId>,
        snapshot: TaskFields,
    ) -> Self {
        NavFrame {
            task_id: task_id.into(),
            list_id: list_id.into(),
            snapshot: Some(snapshot),
        }
    }
}

/// History of drilled-into task views. `push` on drill-in, `pop` on back.
/// Popping past the last frame means the task view closes entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavStack {
    frames: Vec<NavFrame>,
}

impl NavStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the currently open task before drilling into another one.
    pub fn push(&mut self, frame: NavFrame) {
        if self.frames.len() >= NAV_STACK_LIMIT {
            self.frames.remove(0);
        }
        self.frames.push(frame);
    }

    /// The frame to restore into view, or `None` when the stack is empty
    /// and the task view should close.
    pub fn pop(&mut self) -> Option<NavFrame> {
        self.frames.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Discard all history (e.g. when the board view closes).
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
