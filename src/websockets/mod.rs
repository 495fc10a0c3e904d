// Public API
pub use connection_registry::{
    BroadcastReport, ConnectionHandle, ConnectionId, ConnectionRegistry, DeliveryError,
    DeregisterOutcome, Registration,
};
pub use handler::{
    format_relay_message, run_connection, websocket_handler, ConnectionOutcome, ConnectionState,
    RelayMessageHandler,
};
pub use socket::{
    Connection, ConnectionContext, MessageHandler, SocketError, SocketEvent, SocketWrapper,
};

// Internal modules
mod connection_registry;
mod handler;
mod socket;
