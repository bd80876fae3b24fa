use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller information resolved from a validated bearer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    session_id: Uuid,
    user_id: Uuid,
}

impl CallerIdentity {
    /// Creates a caller identity from a validated session.
    #[must_use]
    pub fn new(session_id: Uuid, user_id: Uuid) -> Self {
        Self {
            session_id,
            user_id,
        }
    }

    /// Returns the backing session identifier.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Returns the authenticated user identifier.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}
