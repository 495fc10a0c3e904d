#![allow(dead_code)]

use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

use meeting_relay::{websockets::run_connection, ConnectionOutcome};

use super::mocks::{mock_socket, MockClient};
use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Starts a connection task for any meeting id, without waiting for it
    pub fn connect(
        &self,
        meeting_id: &str,
        username: &str,
    ) -> (MockClient, JoinHandle<ConnectionOutcome>) {
        let (socket, client) = mock_socket(username);
        let task = tokio::spawn(run_connection(
            Box::new(socket),
            meeting_id.to_string(),
            username.to_string(),
            self.state.clone(),
        ));
        (client, task)
    }

    /// Joins the test meeting and waits until the connection is registered
    pub async fn join(&mut self, username: &str) {
        let before = self.connection_count();
        let (client, task) = self.connect(&self.meeting_id, username);

        self.wait_for_connection_count(before + 1).await;

        self.clients.insert(username.to_string(), client);
        self.tasks.insert(username.to_string(), task);
    }

    pub async fn wait_for_connection_count(&self, expected: usize) {
        timeout(Duration::from_secs(2), async {
            while self.connection_count() != expected {
                sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {} live connections, found {}",
                expected,
                self.connection_count()
            )
        });
    }

    pub fn connection_count(&self) -> usize {
        self.state
            .connection_registry
            .connection_count(&self.meeting_id)
    }

    pub fn client(&self, username: &str) -> &MockClient {
        self.clients
            .get(username)
            .unwrap_or_else(|| panic!("{} has not joined", username))
    }

    pub fn client_mut(&mut self, username: &str) -> &mut MockClient {
        self.clients
            .get_mut(username)
            .unwrap_or_else(|| panic!("{} has not joined", username))
    }

    /// Send a text message from a participant
    pub fn send(&self, username: &str, text: &str) {
        self.client(username).send_text(text);
    }

    /// Cleanly disconnect a participant and wait for its task to finish
    pub async fn disconnect(&mut self, username: &str) -> ConnectionOutcome {
        self.client(username).hang_up();
        self.finish(username).await
    }

    /// Break a participant's transport and wait for its task to finish
    pub async fn fail_transport(&mut self, username: &str) -> ConnectionOutcome {
        self.client(username).fail_transport("connection reset by peer");
        self.finish(username).await
    }

    /// Wait for a participant's connection task to end on its own
    pub async fn finish(&mut self, username: &str) -> ConnectionOutcome {
        let task = self
            .tasks
            .remove(username)
            .unwrap_or_else(|| panic!("{} has no running connection", username));
        timeout(Duration::from_secs(2), task)
            .await
            .expect("connection task did not finish")
            .expect("connection task panicked")
    }

    /// Cancel a participant's connection task mid-flight, as a server shutdown would
    pub async fn abort(&mut self, username: &str) {
        let task = self
            .tasks
            .remove(username)
            .unwrap_or_else(|| panic!("{} has no running connection", username));
        task.abort();
        let result = timeout(Duration::from_secs(2), task)
            .await
            .expect("aborted task did not finish");
        assert!(
            result.is_err_and(|e| e.is_cancelled()),
            "{}'s task ended before it could be aborted",
            username
        );
    }

    pub fn is_connected(&self, username: &str) -> bool {
        self.tasks
            .get(username)
            .is_some_and(|task| !task.is_finished())
    }
}
