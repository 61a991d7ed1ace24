pub mod drafts;
pub mod nav;
pub mod session;
pub mod sync;

pub use drafts::{DraftQueue, DraftSubtask, VIRTUAL_PARENT};
pub use nav::{NavFrame, NavStack};
pub use session::Session;
pub use sync::{BoardClient, Mutation, PendingRequest, RequestId, SyncClient, SyncState};
