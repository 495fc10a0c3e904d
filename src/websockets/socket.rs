use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::stream::StreamExt;
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use super::connection_registry::ConnectionId;

/// What the receive side of a socket produced
#[derive(Debug)]
pub enum SocketEvent {
    /// A text frame from the client
    Message(String),
    /// The client closed the connection, or the stream ended
    Disconnected,
    /// The transport failed
    Error(SocketError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SocketError {
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Wait for the next meaningful event from the client
    async fn receive_event(&mut self) -> SocketEvent;

    /// Close the connection with a status code and reason
    async fn close_with(&mut self, code: u16, reason: String) -> Result<(), SocketError>;

    /// Close the connection normally
    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_event(&mut self) -> SocketEvent {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return SocketEvent::Message(text),
                Some(Ok(Message::Close(_))) | None => return SocketEvent::Disconnected,
                Some(Ok(Message::Binary(data))) => {
                    debug!(len = data.len(), "Ignoring binary frame");
                }
                Some(Ok(_)) => {} // Ping/pong are answered by axum
                Some(Err(e)) => {
                    return SocketEvent::Error(SocketError::ReceiveFailed(e.to_string()))
                }
            }
        }
    }

    async fn close_with(&mut self, code: u16, reason: String) -> Result<(), SocketError> {
        self.send(Message::Close(Some(CloseFrame {
            code,
            reason: Cow::Owned(reason),
        })))
        .await
        .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// Who is on the other end of a connection
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub connection_id: ConnectionId,
    pub meeting_id: String,
    pub username: String,
}

/// Handler for incoming WebSocket messages
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle an incoming message from the client
    async fn handle_message(&self, context: &ConnectionContext, message: String);
}

/// Connection represents a managed WebSocket connection
/// It is used to send and receive messages to and from the client
/// The outbound receiver is fed by the ConnectionRegistry through the connection's handle
pub struct Connection {
    context: ConnectionContext,
    socket: Box<dyn SocketWrapper>,
    outbound_receiver: mpsc::UnboundedReceiver<String>,
    message_handler: Arc<dyn MessageHandler>,
}

impl Connection {
    pub fn new(
        context: ConnectionContext,
        socket: Box<dyn SocketWrapper>,
        outbound_receiver: mpsc::UnboundedReceiver<String>,
        message_handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            context,
            socket,
            outbound_receiver,
            message_handler,
        }
    }

    /// Run the connection - handles both sending and receiving until disconnect
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            tokio::select! {
                // Handle outbound messages (from other participants to this client)
                msg = self.outbound_receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.socket.send_message(message).await?
                        }
                        None => break, // Channel closed, disconnect
                    }
                }

                // Handle inbound messages (from this client to the meeting)
                event = self.socket.receive_event() => {
                    match event {
                        SocketEvent::Message(message) => {
                            self.message_handler
                                .handle_message(&self.context, message)
                                .await;
                        }
                        SocketEvent::Disconnected => break,
                        SocketEvent::Error(e) => return Err(e),
                    }
                }
            }
        }

        // Clean disconnect
        let _ = self.socket.close().await;
        Ok(())
    }
}
