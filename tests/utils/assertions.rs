//! Test assertion helpers
#![allow(dead_code)] // Test utilities may not all be used in every test

use tokio::time::{sleep, timeout, Duration};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

impl TestSetup {
    /// Next relayed message for a participant; panics if none arrives
    pub async fn next_message(&mut self, username: &str) -> String {
        let client = self.client_mut(username);
        timeout(Duration::from_secs(2), client.recv())
            .await
            .unwrap_or_else(|_| panic!("{} should have received a message", username))
            .unwrap_or_else(|| panic!("{}'s connection is closed", username))
    }

    /// Asserts that each listed participant receives exactly this message next
    pub async fn assert_received(&mut self, usernames: &[&str], expected: &str) {
        for username in usernames {
            let message = self.next_message(username).await;
            assert_eq!(message, expected, "{} received the wrong message", username);
        }
    }

    /// Asserts that nothing arrives for a participant within a short window
    pub async fn assert_no_message(&mut self, username: &str) {
        let client = self.client_mut(username);
        if let Ok(Some(message)) = timeout(Duration::from_millis(50), client.recv()).await {
            panic!("{} should not have received {:?}", username, message);
        }
    }

    /// Participants currently recorded on the meeting
    pub async fn participants(&self) -> Vec<String> {
        self.state
            .meeting_service
            .get_meeting(&self.meeting_id)
            .await
            .unwrap()
            .participants
    }

    /// Waits until the recorded participants match, for cleanup that runs in the background
    pub async fn assert_participants_become(&self, expected: &[&str]) {
        let settled = timeout(Duration::from_secs(2), async {
            while self.participants().await != expected {
                sleep(Duration::from_millis(2)).await;
            }
        })
        .await;
        if settled.is_err() {
            panic!(
                "participants should be {:?}, found {:?}",
                expected,
                self.participants().await
            );
        }
    }
}
