// Library crate for the meeting relay server
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod meeting;
pub mod routes;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::{ConfigError, MeetingIdStyle, ServerConfig};
pub use meeting::{models::MeetingModel, MeetingService};
pub use routes::build_router;
pub use shared::{AppError, AppState};
pub use websockets::{
    BroadcastReport, ConnectionHandle, ConnectionId, ConnectionOutcome, ConnectionRegistry,
    DeregisterOutcome, SocketEvent, SocketWrapper,
};
