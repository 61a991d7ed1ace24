use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ListId, TaskFields, TaskId};
use crate::store::BoardStore;

/// Sentinel key for drafts queued under a task that is still being created
/// and has no server id yet.
pub const VIRTUAL_PARENT: &str = "new";

/// A subtask the user has queued but the server has never seen. Carries a
/// temporary identifier and the list it will be created in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSubtask {
    pub temp_id: String,
    pub target_list_id: ListId,
    pub fields: TaskFields,
}

/// Client-side staging area for subtasks of not-yet-persisted parents.
///
/// Drafts are keyed by the (real or virtual) parent identifier and never
/// count toward ordering or linking invariants until materialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftQueue {
    entries: IndexMap<String, Vec<DraftSubtask>>,
    next_temp: u64,
}

impl DraftQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a draft under `parent_key`, returning its temporary id.
    pub fn queue_draft(
        &mut self,
        parent_key: &str,
        fields: TaskFields,
        target_list_id: ListId,
    ) -> String {
        self.next_temp += 1;
        let temp_id = format!("temp-{}", self.next_temp);
        self.entries
            .entry(parent_key.to_string())
            .or_default()
            .push(DraftSubtask {
                temp_id: temp_id.clone(),
                target_list_id,
                fields,
            });
        temp_id
    }

    /// Remove a queued draft before materialization. Absent ids are a
    /// no-op, not an error.
    pub fn remove_draft(&mut self, parent_key: &str, temp_id: &str) {
        if let Some(drafts) = self.entries.get_mut(parent_key) {
            drafts.retain(|d| d.temp_id != temp_id);
            if drafts.is_empty() {
                self.entries.shift_remove(parent_key);
            }
        }
    }

    /// Drafts queued under `parent_key`, in queue order.
    pub fn drafts(&self, parent_key: &str) -> &[DraftSubtask] {
        self.entries
            .get(parent_key)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    /// Re-key drafts queued under the virtual sentinel to the real parent
    /// id, the instant the parent task is persisted. This is the only
    /// allowed key rewrite.
    pub fn promote(&mut self, real_parent_id: &str) {
        if let Some(drafts) = self.entries.shift_remove(VIRTUAL_PARENT) {
            self.entries
                .entry(real_parent_id.to_string())
                .or_default()
                .extend(drafts);
        }
    }

    /// Discard all drafts under `parent_key` (the enclosing modal was
    /// abandoned without saving).
    pub fn discard(&mut self, parent_key: &str) {
        self.entries.shift_remove(parent_key);
    }

    /// Create every draft queued under `parent_key` against the real,
    /// persisted parent, in queue order. Returns the number created.
    ///
    /// On the first failure the remaining creations are aborted and the
    /// error surfaced; drafts already materialized stay created on the
    /// server, so the caller must refetch authoritative state.
    pub fn materialize<S: BoardStore>(
        &mut self,
        parent_key: &str,
        real_parent_id: &TaskId,
        caller: &str,
        board_id: &str,
        store: &mut S,
    ) -> Result<usize> {
        let queued = match self.entries.shift_remove(parent_key) {
            Some(queued) => queued,
            None => return Ok(0),
        };

        let mut created = 0;
        for (i, draft) in queued.iter().enumerate() {
            if let Err(e) = store.create_subtask(
                caller,
                board_id,
                real_parent_id,
                &draft.target_list_id,
                &draft.fields,
            ) {
                // Put the failed draft and the rest back for inspection.
                self.entries
                    .insert(parent_key.to_string(), queued[i..].to_vec());
                return Err(e);
            }
            created += 1;
        }
        Ok(created)
    }
}
