use serde::{Deserialize, Serialize};

use crate::client::session::Session;
use crate::error::{BoardError, Result};
use crate::model::{Board, ListId, TaskFields, TaskId, TaskPatch};
use crate::ops::{board_ops, ordering, subtask};
use crate::store::BoardStore;

pub type RequestId = u64;

/// A user-initiated board mutation, encoded as data so it can be applied
/// optimistically to the local view and independently executed against the
/// authoritative store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    AddList {
        title: String,
    },
    ReorderLists {
        order: Vec<ListId>,
    },
    DeleteList {
        list_id: ListId,
    },
    AddTask {
        list_id: ListId,
        title: String,
    },
    UpdateTask {
        list_id: ListId,
        task_id: TaskId,
        patch: TaskPatch,
    },
    ReorderTasks {
        list_id: ListId,
        order: Vec<TaskId>,
    },
    MoveTask {
        task_id: TaskId,
        source_list_id: ListId,
        dest_list_id: ListId,
    },
    DeleteTask {
        list_id: ListId,
        task_id: TaskId,
    },
    CreateSubtask {
        parent_task_id: TaskId,
        target_list_id: ListId,
        fields: TaskFields,
    },
    AddComment {
        list_id: ListId,
        task_id: TaskId,
        text: String,
    },
}

/// Execute one mutation against the authoritative store, returning the
/// updated board document.
pub fn execute<S: BoardStore>(
    store: &mut S,
    caller: &str,
    board_id: &str,
    mutation: &Mutation,
) -> Result<Board> {
    match mutation {
        Mutation::AddList { title } => store.add_list(caller, board_id, title),
        Mutation::ReorderLists { order } => store.reorder_lists(caller, board_id, order),
        Mutation::DeleteList { list_id } => {
            store.delete_list(caller, board_id, list_id)?;
            store.fetch_board(caller, board_id)
        }
        Mutation::AddTask { list_id, title } => store.add_task(caller, board_id, list_id, title),
        Mutation::UpdateTask {
            list_id,
            task_id,
            patch,
        } => store.update_task(caller, board_id, list_id, task_id, patch),
        Mutation::ReorderTasks { list_id, order } => {
            store.reorder_tasks(caller, board_id, list_id, order)
        }
        Mutation::MoveTask {
            task_id,
            source_list_id,
            dest_list_id,
        } => store.move_task(caller, board_id, task_id, source_list_id, dest_list_id),
        Mutation::DeleteTask { list_id, task_id } => {
            store.delete_task(caller, board_id, list_id, task_id)
        }
        Mutation::CreateSubtask {
            parent_task_id,
            target_list_id,
            fields,
        } => store.create_subtask(caller, board_id, parent_task_id, target_list_id, fields),
        Mutation::AddComment {
            list_id,
            task_id,
            text,
        } => store.add_comment(caller, board_id, list_id, task_id, text),
    }
}

/// Where the local view stands relative to the authoritative store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// The view matches the last known server state.
    Clean,
    /// A mutation is applied locally and a request is in flight.
    Pending,
    /// A response arrived and is being merged into the view.
    Reconciling,
}

/// A mutation applied to the local view whose persistence request has not
/// completed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: RequestId,
    pub mutation: Mutation,
}

/// Optimistic synchronization client for one board.
///
/// Mutations hit the local view synchronously, before the network call
/// resolves; the state machine carries no transport. A driver executes each
/// pending request against a [`BoardStore`] and feeds the completion back:
///
/// - success replaces the view wholesale with the server's document (the
///   server owns derived fields such as ids and timestamps);
/// - failure discards the optimistic state via a full refetch.
///
/// Requests may complete out of order; the last response wins, and a stale
/// response is applied as-is. That divergence window is accepted and
/// corrected by the next refetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncClient {
    session: Option<Session>,
    board: Board,
    state: SyncState,
    in_flight: Vec<PendingRequest>,
    next_request: u64,
    next_temp: u64,
}

impl SyncClient {
    /// Fetch the board and open a clean view of it.
    pub fn open<S: BoardStore>(session: Session, store: &S, board_id: &str) -> Result<Self> {
        let board = store.fetch_board(&session.user_id, board_id)?;
        Ok(SyncClient {
            session: Some(session),
            board,
            state: SyncState::Clean,
            in_flight: Vec::new(),
            next_request: 0,
            next_temp: 0,
        })
    }

    /// The local, possibly optimistic, view of the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Requests issued but not yet completed, oldest first.
    pub fn pending(&self) -> &[PendingRequest] {
        &self.in_flight
    }

    pub fn request(&self, id: RequestId) -> Option<&PendingRequest> {
        self.in_flight.iter().find(|r| r.id == id)
    }

    /// Apply a mutation to the local view and record its persistence
    /// request. The view reflects the mutation immediately; if local
    /// validation rejects it, no request is issued and nothing changes.
    pub fn mutate(&mut self, mutation: Mutation) -> Result<RequestId> {
        self.require_session()?;
        self.apply_local(&mutation)?;
        self.next_request += 1;
        let id = self.next_request;
        self.in_flight.push(PendingRequest { id, mutation });
        self.state = SyncState::Pending;
        Ok(id)
    }

    /// Feed back the completion of a persistence request.
    ///
    /// On failure the optimistic mutation is discarded by refetching the
    /// whole board rather than attempting a fine-grained undo. The store is
    /// needed only for that refetch path.
    pub fn complete<S: BoardStore>(
        &mut self,
        request_id: RequestId,
        outcome: Result<Board>,
        store: &S,
    ) -> Result<()> {
        self.in_flight.retain(|r| r.id != request_id);
        self.state = SyncState::Reconciling;
        let result = match outcome {
            Ok(document) => {
                self.board = document;
                Ok(())
            }
            Err(_) => self.refetch(store),
        };
        self.state = if self.in_flight.is_empty() {
            SyncState::Clean
        } else {
            SyncState::Pending
        };
        result
    }

    /// Execute the oldest pending request against the store and complete
    /// it. Returns false when nothing was pending.
    pub fn run_next<S: BoardStore>(&mut self, store: &mut S) -> Result<bool> {
        let Some(request) = self.in_flight.first().cloned() else {
            return Ok(false);
        };
        let caller = self.require_session()?.user_id.clone();
        let board_id = self.board.id.clone();
        let outcome = execute(store, &caller, &board_id, &request.mutation);
        self.complete(request.id, outcome, store)?;
        Ok(true)
    }

    /// Replace the local view with the server's current document.
    ///
    /// A not-found or authorization failure here means the board itself is
    /// gone for this caller; the surrounding UI navigates away.
    pub fn refetch<S: BoardStore>(&mut self, store: &S) -> Result<()> {
        let caller = self.require_session()?.user_id.clone();
        self.board = store.fetch_board(&caller, &self.board.id)?;
        Ok(())
    }

    /// Tear down the session: clears it and discards all in-flight state.
    pub fn logout(&mut self) {
        self.session = None;
        self.in_flight.clear();
        self.state = SyncState::Clean;
    }

    /// Temporary client-side id for an optimistically created entity. The
    /// server's document replaces it on reconciliation.
    fn temp_id(&mut self, prefix: &str) -> String {
        self.next_temp += 1;
        format!("temp-{}-{}", prefix, self.next_temp)
    }

    fn require_session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| BoardError::Authorization("no active session".into()))
    }

    fn apply_local(&mut self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::AddList { title } => {
                let id = self.temp_id("list");
                board_ops::add_list(&mut self.board, id, title)
            }
            Mutation::ReorderLists { order } => ordering::reorder_lists(&mut self.board, order),
            Mutation::DeleteList { list_id } => board_ops::delete_list(&mut self.board, list_id),
            Mutation::AddTask { list_id, title } => {
                let id = self.temp_id("task");
                board_ops::add_task(&mut self.board, list_id, id, title)
            }
            Mutation::UpdateTask {
                list_id,
                task_id,
                patch,
            } => board_ops::update_task(&mut self.board, list_id, task_id, patch),
            Mutation::ReorderTasks { list_id, order } => {
                ordering::reorder_tasks(&mut self.board, list_id, order)
            }
            Mutation::MoveTask {
                task_id,
                source_list_id,
                dest_list_id,
            } => ordering::move_task(&mut self.board, task_id, source_list_id, dest_list_id),
            Mutation::DeleteTask { list_id, task_id } => {
                board_ops::delete_task(&mut self.board, list_id, task_id)
            }
            Mutation::CreateSubtask {
                parent_task_id,
                target_list_id,
                fields,
            } => {
                let id = self.temp_id("task");
                subtask::create_linked_subtask(
                    &mut self.board,
                    id,
                    parent_task_id,
                    target_list_id,
                    fields.clone(),
                )
                .map(|_| ())
            }
            Mutation::AddComment {
                list_id,
                task_id,
                text,
            } => {
                let author = self.require_session()?.user_id.clone();
                board_ops::add_comment(&mut self.board, list_id, task_id, &author, text)
            }
        }
    }
}

/// Synchronous facade over [`SyncClient`] for callers that do not
/// interleave requests: every mutation is driven to completion before
/// returning, and a server-side failure is surfaced after the view has
/// already been resynchronized.
#[derive(Debug)]
pub struct BoardClient<S: BoardStore> {
    store: S,
    client: SyncClient,
}

impl<S: BoardStore> BoardClient<S> {
    pub fn open(store: S, session: Session, board_id: &str) -> Result<Self> {
        let client = SyncClient::open(session, &store, board_id)?;
        Ok(BoardClient { store, client })
    }

    pub fn board(&self) -> &Board {
        self.client.board()
    }

    pub fn sync(&self) -> &SyncClient {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Apply a mutation optimistically and drive it to completion.
    pub fn apply(&mut self, mutation: Mutation) -> Result<()> {
        let id = self.client.mutate(mutation)?;
        let request = self
            .client
            .request(id)
            .cloned()
            .ok_or_else(|| BoardError::NotFound(format!("request {id}")))?;
        let caller = match self.client.session() {
            Some(session) => session.user_id.clone(),
            None => return Err(BoardError::Authorization("no active session".into())),
        };
        let board_id = self.client.board().id.clone();
        let outcome = execute(&mut self.store, &caller, &board_id, &request.mutation);
        let server_error = outcome.as_ref().err().cloned();
        self.client.complete(id, outcome, &self.store)?;
        match server_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn refetch(&mut self) -> Result<()> {
        self.client.refetch(&self.store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn setup() -> (MemoryStore, SyncClient, String, Vec<String>) {
        let mut store = MemoryStore::new();
        let board = store
            .create_board("alice", "Project", &["Todo".into(), "Doing".into()])
            .unwrap();
        let board_id = board.id.clone();
        let lists = board.list_order.clone();
        let session = Session::login("alice", "token-1");
        let client = SyncClient::open(session, &store, &board_id).unwrap();
        (store, client, board_id, lists)
    }

    #[test]
    fn open_starts_clean_with_server_view() {
        let (store, client, board_id, _) = setup();
        assert_eq!(client.state(), SyncState::Clean);
        assert_eq!(
            client.board(),
            &store.fetch_board("alice", &board_id).unwrap()
        );
    }

    #[test]
    fn mutate_is_visible_before_completion() {
        let (_store, mut client, _board_id, lists) = setup();
        client
            .mutate(Mutation::AddTask {
                list_id: lists[0].clone(),
                title: "Optimistic".into(),
            })
            .unwrap();

        assert_eq!(client.state(), SyncState::Pending);
        assert_eq!(client.pending().len(), 1);
        let tasks = client.board().ordered_tasks(&lists[0]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Optimistic");
        assert!(tasks[0].id.starts_with("temp-"));
    }

    #[test]
    fn success_replaces_view_with_server_document() {
        let (mut store, mut client, _board_id, lists) = setup();
        client
            .mutate(Mutation::AddTask {
                list_id: lists[0].clone(),
                title: "Optimistic".into(),
            })
            .unwrap();
        assert!(client.run_next(&mut store).unwrap());

        assert_eq!(client.state(), SyncState::Clean);
        let tasks = client.board().ordered_tasks(&lists[0]);
        assert_eq!(tasks.len(), 1);
        // Server-issued id replaced the temporary one wholesale
        assert!(tasks[0].id.starts_with("task-"));
    }

    #[test]
    fn local_validation_failure_issues_no_request() {
        let (_store, mut client, _board_id, lists) = setup();
        let before = client.board().clone();
        let result = client.mutate(Mutation::AddTask {
            list_id: lists[0].clone(),
            title: "   ".into(),
        });
        assert!(matches!(result, Err(BoardError::Validation(_))));
        assert_eq!(client.state(), SyncState::Clean);
        assert!(client.pending().is_empty());
        assert_eq!(client.board(), &before);
    }

    #[test]
    fn failure_discards_optimistic_state_via_refetch() {
        let (store, mut client, board_id, lists) = setup();
        let id = client
            .mutate(Mutation::AddTask {
                list_id: lists[0].clone(),
                title: "Doomed".into(),
            })
            .unwrap();
        assert_eq!(client.board().ordered_tasks(&lists[0]).len(), 1);

        // Simulated network failure: the request never reached the store
        client
            .complete(
                id,
                Err(BoardError::NotFound("network unreachable".into())),
                &store,
            )
            .unwrap();

        assert_eq!(client.state(), SyncState::Clean);
        assert_eq!(
            client.board(),
            &store.fetch_board("alice", &board_id).unwrap()
        );
        assert!(client.board().ordered_tasks(&lists[0]).is_empty());
    }

    #[test]
    fn out_of_order_completion_last_response_wins() {
        let (mut store, mut client, board_id, lists) = setup();
        // Seed three tasks through the server
        for title in ["a", "b", "c"] {
            client
                .mutate(Mutation::AddTask {
                    list_id: lists[0].clone(),
                    title: title.into(),
                })
                .unwrap();
            client.run_next(&mut store).unwrap();
        }
        let ids: Vec<TaskId> = client
            .board()
            .ordered_tasks(&lists[0])
            .iter()
            .map(|t| t.id.clone())
            .collect();

        // Two rapid reorders issued concurrently
        let first = client
            .mutate(Mutation::ReorderTasks {
                list_id: lists[0].clone(),
                order: vec![ids[1].clone(), ids[0].clone(), ids[2].clone()],
            })
            .unwrap();
        let second = client
            .mutate(Mutation::ReorderTasks {
                list_id: lists[0].clone(),
                order: vec![ids[2].clone(), ids[1].clone(), ids[0].clone()],
            })
            .unwrap();
        assert_eq!(client.pending().len(), 2);

        let caller = "alice";
        let m2 = client.request(second).unwrap().mutation.clone();
        let out2 = execute(&mut store, caller, &board_id, &m2);
        let m1 = client.request(first).unwrap().mutation.clone();
        let out1 = execute(&mut store, caller, &board_id, &m1);

        // Completions arrive out of order; the stale one lands last and
        // clobbers the newer view. Accepted by design.
        client.complete(second, out2, &store).unwrap();
        client.complete(first, out1, &store).unwrap();
        assert_eq!(client.state(), SyncState::Clean);
        let current: Vec<TaskId> = client
            .board()
            .ordered_tasks(&lists[0])
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(current, vec![ids[1].clone(), ids[0].clone(), ids[2].clone()]);
    }

    #[test]
    fn logout_discards_session_and_in_flight_state() {
        let (_store, mut client, _board_id, lists) = setup();
        client
            .mutate(Mutation::AddTask {
                list_id: lists[0].clone(),
                title: "Pending".into(),
            })
            .unwrap();
        assert_eq!(client.pending().len(), 1);

        client.logout();
        assert!(client.session().is_none());
        assert!(client.pending().is_empty());
        assert_eq!(client.state(), SyncState::Clean);

        let result = client.mutate(Mutation::AddList {
            title: "After logout".into(),
        });
        assert!(matches!(result, Err(BoardError::Authorization(_))));
    }

    #[test]
    fn client_state_survives_serialization() {
        let (_store, mut client, _board_id, lists) = setup();
        client
            .mutate(Mutation::ReorderLists {
                order: vec![lists[1].clone(), lists[0].clone()],
            })
            .unwrap();

        let json = serde_json::to_string(&client).unwrap();
        let restored: SyncClient = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.state(), SyncState::Pending);
        assert_eq!(restored.pending(), client.pending());
        assert_eq!(restored.board(), client.board());
    }

    #[test]
    fn comments_use_the_session_user_as_author() {
        let (mut store, mut client, _board_id, lists) = setup();
        client
            .mutate(Mutation::AddTask {
                list_id: lists[0].clone(),
                title: "Task".into(),
            })
            .unwrap();
        client.run_next(&mut store).unwrap();
        let task_id = client.board().ordered_tasks(&lists[0])[0].id.clone();

        client
            .mutate(Mutation::AddComment {
                list_id: lists[0].clone(),
                task_id,
                text: "ship it".into(),
            })
            .unwrap();
        let tasks = client.board().ordered_tasks(&lists[0]);
        assert_eq!(tasks[0].comments[0].author, "alice");
    }

    #[test]
    fn board_client_facade_applies_and_reconciles() {
        let mut store = MemoryStore::new();
        let board = store.create_board("alice", "Project", &["Todo".into()]).unwrap();
        let board_id = board.id.clone();
        let todo = board.list_order[0].clone();
        let mut client =
            BoardClient::open(store, Session::login("alice", "token-1"), &board_id).unwrap();

        client
            .apply(Mutation::AddTask {
                list_id: todo.clone(),
                title: "One".into(),
            })
            .unwrap();
        assert_eq!(client.sync().state(), SyncState::Clean);
        assert_eq!(client.board().ordered_tasks(&todo).len(), 1);

        // Another client deletes the task on the server behind our back
        let task_id = client.board().ordered_tasks(&todo)[0].id.clone();
        client
            .store_mut()
            .delete_task("alice", &board_id, &todo, &task_id)
            .unwrap();

        // The stale local view still accepts the edit, the server rejects
        // it, and the failure-triggered refetch drops the task.
        let result = client.apply(Mutation::UpdateTask {
            list_id: todo.clone(),
            task_id,
            patch: TaskPatch {
                title: Some("Renamed".into()),
                ..Default::default()
            },
        });
        assert!(matches!(result, Err(BoardError::NotFound(_))));
        assert!(client.board().ordered_tasks(&todo).is_empty());
        assert_eq!(client.sync().state(), SyncState::Clean);
    }
}
