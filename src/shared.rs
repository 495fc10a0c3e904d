use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{MeetingIdStyle, ServerConfig};
use crate::meeting::{
    repository::InMemoryMeetingRepository, MeetingIdGenerator, MeetingService,
    PetnameMeetingIdGenerator, RandomMeetingIdGenerator,
};
use crate::websockets::ConnectionRegistry;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub meeting_service: Arc<MeetingService>,
    pub connection_registry: Arc<ConnectionRegistry>,
    /// Whether relayed messages are also sent back to their sender
    pub echo_to_sender: bool,
}

impl AppState {
    pub fn new(
        meeting_service: Arc<MeetingService>,
        connection_registry: Arc<ConnectionRegistry>,
        echo_to_sender: bool,
    ) -> Self {
        Self {
            meeting_service,
            connection_registry,
            echo_to_sender,
        }
    }

    /// Wires the in-memory implementations according to the configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        let id_generator: Arc<dyn MeetingIdGenerator> = match config.meeting_id_style {
            MeetingIdStyle::Random => Arc::new(RandomMeetingIdGenerator::new()),
            MeetingIdStyle::Petname => Arc::new(PetnameMeetingIdGenerator::new()),
        };
        let meeting_service = Arc::new(MeetingService::new(
            Arc::new(InMemoryMeetingRepository::new()),
            id_generator,
        ));

        Self::new(
            meeting_service,
            Arc::new(ConnectionRegistry::new()),
            config.echo_to_sender,
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
