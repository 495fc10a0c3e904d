use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::meeting;
use crate::shared::AppState;
use crate::websockets;

/// Builds the HTTP + WebSocket router for the relay
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(|| async { "Meeting relay is running" }))
        .route("/create_meeting/", post(meeting::create_meeting))
        .route("/meetings", get(meeting::list_meetings))
        .route("/meetings/:meeting_id", get(meeting::get_meeting))
        .route("/ws/:meeting_id/:username", get(websockets::websocket_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
