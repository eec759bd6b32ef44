use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Link a client to the calling coach by the client's account email.
#[derive(Debug, Deserialize)]
pub struct AddClientRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ClientSummary {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub linked_at: OffsetDateTime,
}
