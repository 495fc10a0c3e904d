use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identity of one live connection, unique for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum DeliveryError {
    #[error("Connection {0} is closed")]
    Closed(ConnectionId),
}

/// A reference to a live connection: the sending half of its outbound queue.
/// The transport itself stays with the connection task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    username: String,
    sender: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn new(username: impl Into<String>, sender: mpsc::UnboundedSender<String>) -> Self {
        Self::with_id(ConnectionId::new(), username, sender)
    }

    pub fn with_id(
        id: ConnectionId,
        username: impl Into<String>,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn deliver(&self, message: &str) -> Result<(), DeliveryError> {
        self.sender
            .send(message.to_string())
            .map_err(|_| DeliveryError::Closed(self.id))
    }
}

/// Outcome of a single fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeregisterOutcome {
    /// The connection was removed; `meeting_ended` is set when it was the last one
    Removed { meeting_ended: bool },
    /// The connection was not registered under that meeting
    NotRegistered,
}

#[derive(Default)]
struct RegistryState {
    // meeting_id -> live connections, never holds an empty set
    meetings: HashMap<String, HashMap<ConnectionId, ConnectionHandle>>,
    // connection_id -> meeting_id
    locations: HashMap<ConnectionId, String>,
}

impl RegistryState {
    fn remove(&mut self, meeting_id: &str, connection_id: ConnectionId) -> DeregisterOutcome {
        let Some(connections) = self.meetings.get_mut(meeting_id) else {
            return DeregisterOutcome::NotRegistered;
        };
        if connections.remove(&connection_id).is_none() {
            return DeregisterOutcome::NotRegistered;
        }
        if self.locations.get(&connection_id).map(String::as_str) == Some(meeting_id) {
            self.locations.remove(&connection_id);
        }

        let meeting_ended = connections.is_empty();
        if meeting_ended {
            self.meetings.remove(meeting_id);
        }
        DeregisterOutcome::Removed { meeting_ended }
    }
}

/// Live connections grouped by meeting.
///
/// Mutations take the write lock and fan-out iterates under the read lock, so
/// a broadcast never observes a set that is halfway through a change. Sends are
/// non-blocking queue pushes, the lock is never held across an `.await`.
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a connection to a meeting's set, creating the set if needed.
    /// Registering the same connection again is a no-op; registering it under a
    /// different meeting moves it.
    pub fn register(&self, meeting_id: &str, handle: ConnectionHandle) {
        let connection_id = handle.id();
        let mut state = self.write();

        if let Some(previous) = state.locations.get(&connection_id).cloned() {
            if previous != meeting_id {
                warn!(
                    connection_id = %connection_id,
                    from = %previous,
                    to = %meeting_id,
                    "Connection moved between meetings"
                );
                if let DeregisterOutcome::Removed {
                    meeting_ended: true,
                } = state.remove(&previous, connection_id)
                {
                    info!(meeting_id = %previous, "Meeting ended (no participants left)");
                }
            }
        }

        let username = handle.username.clone();
        let connections = state.meetings.entry(meeting_id.to_string()).or_default();
        connections.insert(connection_id, handle);
        let connection_count = connections.len();
        state
            .locations
            .insert(connection_id, meeting_id.to_string());

        debug!(
            meeting_id = %meeting_id,
            connection_id = %connection_id,
            username = %username,
            connection_count,
            "Connection registered"
        );
    }

    /// Removes a connection from a meeting's set. Unknown connections are a
    /// no-op. The set is dropped as soon as it becomes empty.
    pub fn deregister(&self, meeting_id: &str, connection_id: ConnectionId) -> DeregisterOutcome {
        let outcome = self.write().remove(meeting_id, connection_id);

        match outcome {
            DeregisterOutcome::Removed { meeting_ended } => {
                debug!(
                    meeting_id = %meeting_id,
                    connection_id = %connection_id,
                    "Connection deregistered"
                );
                if meeting_ended {
                    info!(meeting_id = %meeting_id, "Meeting ended (no participants left)");
                }
            }
            DeregisterOutcome::NotRegistered => {
                debug!(
                    meeting_id = %meeting_id,
                    connection_id = %connection_id,
                    "Connection was not registered"
                );
            }
        }

        outcome
    }

    /// Delivers a message to every connection in the meeting
    pub fn broadcast(&self, meeting_id: &str, message: &str) -> BroadcastReport {
        self.fan_out(meeting_id, message, None)
    }

    /// Delivers a message to every connection in the meeting except the sender
    pub fn broadcast_except(
        &self,
        meeting_id: &str,
        sender: ConnectionId,
        message: &str,
    ) -> BroadcastReport {
        self.fan_out(meeting_id, message, Some(sender))
    }

    fn fan_out(
        &self,
        meeting_id: &str,
        message: &str,
        exclude: Option<ConnectionId>,
    ) -> BroadcastReport {
        let state = self.read();
        let mut report = BroadcastReport::default();

        let Some(connections) = state.meetings.get(meeting_id) else {
            debug!(meeting_id = %meeting_id, "No live connections to broadcast to");
            return report;
        };

        for handle in connections.values() {
            if Some(handle.id()) == exclude {
                continue;
            }
            // A failed recipient is left registered; its own task deregisters it
            match handle.deliver(message) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        meeting_id = %meeting_id,
                        username = %handle.username(),
                        error = %e,
                        "Failed to deliver message"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    pub fn connection_count(&self, meeting_id: &str) -> usize {
        self.read()
            .meetings
            .get(meeting_id)
            .map_or(0, HashMap::len)
    }

    pub fn is_registered(&self, meeting_id: &str, connection_id: ConnectionId) -> bool {
        self.read()
            .meetings
            .get(meeting_id)
            .is_some_and(|connections| connections.contains_key(&connection_id))
    }

    /// Meetings that currently have at least one live connection
    pub fn active_meetings(&self) -> Vec<String> {
        self.read().meetings.keys().cloned().collect()
    }
}

/// Keeps a connection registered for as long as it is alive.
///
/// Deregistration happens exactly once: either through `release` or, if the
/// owning task exits any other way (panic, cancellation), on drop.
pub struct Registration {
    registry: Arc<ConnectionRegistry>,
    meeting_id: String,
    connection_id: ConnectionId,
    released: bool,
}

impl Registration {
    pub fn acquire(
        registry: Arc<ConnectionRegistry>,
        meeting_id: String,
        handle: ConnectionHandle,
    ) -> Self {
        let connection_id = handle.id();
        registry.register(&meeting_id, handle);
        Self {
            registry,
            meeting_id,
            connection_id,
            released: false,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn release(mut self) -> DeregisterOutcome {
        self.released = true;
        self.registry
            .deregister(&self.meeting_id, self.connection_id)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if !self.released {
            self.registry
                .deregister(&self.meeting_id, self.connection_id);
        }
    }
}
