use rolegrid_application::SessionRecord;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_active: bool,
    /// True for the session serving this very request.
    pub current: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl SessionResponse {
    pub fn from_record(session: SessionRecord, current_session: Uuid) -> Self {
        Self {
            id: session.id.as_uuid(),
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            is_active: session.is_active,
            current: session.id.as_uuid() == current_session,
            created_at: session.created_at,
            expires_at: session.expires_at,
        }
    }
}
