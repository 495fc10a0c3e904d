use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request payload for creating a new meeting
#[derive(Debug, Deserialize)]
pub struct MeetingCreateRequest {
    pub host: String,
}

/// Response for meeting creation
#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingCreateResponse {
    pub meeting_id: String,
}

/// Meeting details including the number of live connections
#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingResponse {
    pub id: String,
    pub host: String,
    pub participants: Vec<String>,
    pub active_connections: usize,
    pub created_at: DateTime<Utc>,
}
