use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::{
    models::MeetingModel,
    types::{MeetingCreateRequest, MeetingCreateResponse, MeetingResponse},
};
use crate::shared::{AppError, AppState};

fn to_response(meeting: MeetingModel, state: &AppState) -> MeetingResponse {
    MeetingResponse {
        active_connections: state.connection_registry.connection_count(&meeting.id),
        id: meeting.id,
        host: meeting.host,
        participants: meeting.participants,
        created_at: meeting.created_at,
    }
}

/// HTTP handler for creating a new meeting
///
/// POST /create_meeting/
/// Returns the generated meeting ID
#[instrument(name = "create_meeting", skip(state))]
pub async fn create_meeting(
    State(state): State<AppState>,
    Json(request): Json<MeetingCreateRequest>,
) -> Result<Json<MeetingCreateResponse>, AppError> {
    info!(host = %request.host, "Creating new meeting");

    let response = state.meeting_service.create_meeting(request).await?;

    Ok(Json(response))
}

/// HTTP handler for listing all meetings
///
/// GET /meetings
#[instrument(name = "list_meetings", skip(state))]
pub async fn list_meetings(
    State(state): State<AppState>,
) -> Result<Json<Vec<MeetingResponse>>, AppError> {
    let meetings = state.meeting_service.list_meetings().await?;

    info!(meeting_count = meetings.len(), "Meetings listed successfully");

    Ok(Json(
        meetings
            .into_iter()
            .map(|meeting| to_response(meeting, &state))
            .collect(),
    ))
}

/// HTTP handler for a single meeting
///
/// GET /meetings/{meeting_id}
#[instrument(name = "get_meeting", skip(state))]
pub async fn get_meeting(
    Path(meeting_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MeetingResponse>, AppError> {
    let meeting = state.meeting_service.get_meeting(&meeting_id).await?;

    Ok(Json(to_response(meeting, &state)))
}
