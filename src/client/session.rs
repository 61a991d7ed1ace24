use serde::{Deserialize, Serialize};

use crate::model::UserId;

/// The authenticated caller's context, passed to the sync client at
/// construction. Login populates it; logout (on the client) clears it and
/// discards in-flight state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub token: String,
}

impl Session {
    pub fn login(user_id: impl Into<UserId>, token: impl Into<String>) -> Self {
        Session {
            user_id: user_id.into(),
            token: token.into(),
        }
    }
}
