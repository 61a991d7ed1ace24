use serde::{Deserialize, Serialize};

/// Error type shared by the ops, store, and client layers.
///
/// Every fallible operation either succeeds fully or mutates nothing —
/// callers never see a partially applied aggregate behind one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum BoardError {
    /// Missing or malformed input (empty title, bad reorder permutation).
    #[error("validation: {0}")]
    Validation(String),
    /// A board, list, or task identifier does not resolve.
    #[error("not found: {0}")]
    NotFound(String),
    /// The caller is neither the board's owner nor a member.
    #[error("not authorized: {0}")]
    Authorization(String),
    /// A structural constraint would be violated (parent cycle, child due
    /// date past the parent's).
    #[error("constraint: {0}")]
    Constraint(String),
}

pub type Result<T> = std::result::Result<T, BoardError>;
