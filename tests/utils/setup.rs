#![allow(dead_code)]

use std::collections::HashMap;
use tokio::task::JoinHandle;

use meeting_relay::{
    meeting::types::MeetingCreateRequest, AppState, ConnectionOutcome, ServerConfig,
};

use super::mocks::MockClient;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub meeting_id: String,
    pub clients: HashMap<String, MockClient>,
    pub tasks: HashMap<String, JoinHandle<ConnectionOutcome>>,
}

pub struct TestSetupBuilder {
    participants: Vec<String>,
    echo_to_sender: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            participants: vec![],
            echo_to_sender: false,
        }
    }

    pub fn with_participants(mut self, participants: Vec<&str>) -> Self {
        self.participants = participants.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_three_participants(self) -> Self {
        self.with_participants(vec!["alice", "bob", "carol"])
    }

    pub fn with_echo_to_sender(mut self) -> Self {
        self.echo_to_sender = true;
        self
    }

    pub async fn build(self) -> TestSetup {
        let config = ServerConfig {
            echo_to_sender: self.echo_to_sender,
            ..ServerConfig::default()
        };
        let state = AppState::from_config(&config);

        let created = state
            .meeting_service
            .create_meeting(MeetingCreateRequest {
                host: self
                    .participants
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "host".to_string()),
            })
            .await
            .unwrap();

        let mut setup = TestSetup {
            state,
            meeting_id: created.meeting_id,
            clients: HashMap::new(),
            tasks: HashMap::new(),
        };

        for participant in &self.participants {
            setup.join(participant).await;
        }

        setup
    }
}
