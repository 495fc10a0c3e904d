use async_trait::async_trait;
use axum::{
    extract::{
        ws::{close_code, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::meeting::Participation;
use crate::shared::AppState;

use super::connection_registry::{ConnectionHandle, ConnectionRegistry, Registration};
use super::socket::{Connection, ConnectionContext, MessageHandler, SocketWrapper};

/// Lifecycle of a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Joined,
    Receiving,
    Closed,
}

impl ConnectionState {
    /// Allowed transitions; everything else is a programming error
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Joined) | (Connecting, Closed) | (Joined, Receiving) | (Joined, Closed)
                | (Receiving, Closed)
        )
    }
}

/// Tracks the state of one connection and logs every transition
struct Lifecycle {
    state: ConnectionState,
    meeting_id: String,
    username: String,
}

impl Lifecycle {
    fn new(meeting_id: &str, username: &str) -> Self {
        Self {
            state: ConnectionState::Connecting,
            meeting_id: meeting_id.to_string(),
            username: username.to_string(),
        }
    }

    fn advance(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(
            meeting_id = %self.meeting_id,
            username = %self.username,
            from = ?self.state,
            to = ?next,
            "Connection state changed"
        );
        self.state = next;
    }
}

/// How a connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// The meeting did not exist, closed with a policy violation
    Rejected,
    /// The client disconnected
    Closed,
    /// The transport failed
    Failed,
}

/// Builds the text relayed to other participants
pub fn format_relay_message(username: &str, payload: &str) -> String {
    format!("{}: {}", username, payload)
}

/// Message handler that relays every inbound text to the rest of the meeting
pub struct RelayMessageHandler {
    registry: Arc<ConnectionRegistry>,
    echo_to_sender: bool,
}

impl RelayMessageHandler {
    pub fn new(registry: Arc<ConnectionRegistry>, echo_to_sender: bool) -> Self {
        Self {
            registry,
            echo_to_sender,
        }
    }
}

#[async_trait]
impl MessageHandler for RelayMessageHandler {
    async fn handle_message(&self, context: &ConnectionContext, message: String) {
        let outbound = format_relay_message(&context.username, &message);

        let report = if self.echo_to_sender {
            self.registry.broadcast(&context.meeting_id, &outbound)
        } else {
            self.registry
                .broadcast_except(&context.meeting_id, context.connection_id, &outbound)
        };

        debug!(
            meeting_id = %context.meeting_id,
            username = %context.username,
            delivered = report.delivered,
            failed = report.failed,
            "Relayed message"
        );
    }
}

/// WebSocket upgrade handler
///
/// GET /ws/{meeting_id}/{username}
/// The upgrade always completes; unknown meetings are closed afterwards with 1008
#[instrument(name = "websocket_handler", skip(state, ws))]
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path((meeting_id, username)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Response {
    info!(
        meeting_id = %meeting_id,
        username = %username,
        "WebSocket connection requested"
    );

    ws.on_upgrade(move |socket| async move {
        run_connection(Box::new(socket), meeting_id, username, state).await;
    })
}

/// Drives one upgraded connection from validation through to cleanup
pub async fn run_connection(
    mut socket: Box<dyn SocketWrapper>,
    meeting_id: String,
    username: String,
    state: AppState,
) -> ConnectionOutcome {
    let mut lifecycle = Lifecycle::new(&meeting_id, &username);

    match state.meeting_service.meeting_exists(&meeting_id).await {
        Ok(true) => {}
        Ok(false) => {
            info!(
                meeting_id = %meeting_id,
                username = %username,
                "Meeting not found, closing connection"
            );
            let _ = socket
                .close_with(close_code::POLICY, "Meeting not found".to_string())
                .await;
            lifecycle.advance(ConnectionState::Closed);
            return ConnectionOutcome::Rejected;
        }
        Err(e) => {
            warn!(meeting_id = %meeting_id, error = %e, "Failed to look up meeting");
            let _ = socket
                .close_with(close_code::ERROR, "Internal server error".to_string())
                .await;
            lifecycle.advance(ConnectionState::Closed);
            return ConnectionOutcome::Rejected;
        }
    }

    // Create the outbound channel (registry -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    let handle = ConnectionHandle::new(username.clone(), outbound_sender);

    // Declared before the registration so that on an abnormal exit the
    // connection is deregistered first and the participant removed after
    let participation =
        Participation::join(state.meeting_service.clone(), &meeting_id, &username).await;
    let registration = Registration::acquire(
        state.connection_registry.clone(),
        meeting_id.clone(),
        handle,
    );
    let context = ConnectionContext {
        connection_id: registration.connection_id(),
        meeting_id: meeting_id.clone(),
        username: username.clone(),
    };
    lifecycle.advance(ConnectionState::Joined);
    info!(meeting_id = %meeting_id, username = %username, "User joined meeting");

    let message_handler = Arc::new(RelayMessageHandler::new(
        state.connection_registry.clone(),
        state.echo_to_sender,
    ));
    let connection = Connection::new(context, socket, outbound_receiver, message_handler);

    lifecycle.advance(ConnectionState::Receiving);
    let result = connection.run().await;
    lifecycle.advance(ConnectionState::Closed);

    registration.release();
    participation.leave().await;

    match result {
        Ok(()) => {
            info!(
                meeting_id = %meeting_id,
                username = %username,
                "User disconnected from meeting"
            );
            ConnectionOutcome::Closed
        }
        Err(e) => {
            warn!(
                meeting_id = %meeting_id,
                username = %username,
                error = %e,
                "WebSocket connection error"
            );
            ConnectionOutcome::Failed
        }
    }
}
