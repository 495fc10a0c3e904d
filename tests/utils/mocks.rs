#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use meeting_relay::websockets::{SocketError, SocketEvent, SocketWrapper};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Server side of an in-process socket, handed to `run_connection`
pub struct MockSocket {
    inbound: mpsc::UnboundedReceiver<SocketEvent>,
    outbound: mpsc::UnboundedSender<String>,
    close_frame: Arc<Mutex<Option<(u16, String)>>>,
    broken: Arc<AtomicBool>,
}

/// Client side of an in-process socket, driven by the test
pub struct MockClient {
    pub username: String,
    inbound: mpsc::UnboundedSender<SocketEvent>,
    received: mpsc::UnboundedReceiver<String>,
    close_frame: Arc<Mutex<Option<(u16, String)>>>,
    broken: Arc<AtomicBool>,
}

pub fn mock_socket(username: &str) -> (MockSocket, MockClient) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let close_frame = Arc::new(Mutex::new(None));
    let broken = Arc::new(AtomicBool::new(false));

    let socket = MockSocket {
        inbound: inbound_rx,
        outbound: outbound_tx,
        close_frame: close_frame.clone(),
        broken: broken.clone(),
    };
    let client = MockClient {
        username: username.to_string(),
        inbound: inbound_tx,
        received: outbound_rx,
        close_frame,
        broken,
    };
    (socket, client)
}

impl MockClient {
    pub fn send_text(&self, text: &str) {
        let _ = self.inbound.send(SocketEvent::Message(text.to_string()));
    }

    pub fn hang_up(&self) {
        let _ = self.inbound.send(SocketEvent::Disconnected);
    }

    pub fn fail_transport(&self, reason: &str) {
        let _ = self
            .inbound
            .send(SocketEvent::Error(SocketError::ReceiveFailed(
                reason.to_string(),
            )));
    }

    /// Makes every further server-side send fail
    pub fn break_sends(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn close_frame(&self) -> Option<(u16, String)> {
        self.close_frame.lock().unwrap().clone()
    }

    pub async fn recv(&mut self) -> Option<String> {
        self.received.recv().await
    }
}

#[async_trait]
impl SocketWrapper for MockSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(SocketError::SendFailed("broken pipe".to_string()));
        }
        self.outbound
            .send(message)
            .map_err(|_| SocketError::SendFailed("client hung up".to_string()))
    }

    async fn receive_event(&mut self) -> SocketEvent {
        self.inbound
            .recv()
            .await
            .unwrap_or(SocketEvent::Disconnected)
    }

    async fn close_with(&mut self, code: u16, reason: String) -> Result<(), SocketError> {
        *self.close_frame.lock().unwrap() = Some((code, reason));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.close_frame
            .lock()
            .unwrap()
            .get_or_insert((1000, String::new()));
        Ok(())
    }
}
