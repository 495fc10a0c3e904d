use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// In-memory record for a meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingModel {
    pub id: String,
    pub host: String,
    pub participants: Vec<String>, // Usernames in join order, may repeat
    pub created_at: DateTime<Utc>,
}

impl MeetingModel {
    /// Creates a new meeting with no participants
    pub fn new(id: String, host: String) -> Self {
        Self {
            id,
            host,
            participants: vec![],
            created_at: Utc::now(),
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Appends a participant; the same username may join from several connections
    pub fn add_participant(&mut self, username: String) {
        self.participants.push(username);
    }

    /// Removes one occurrence of the username, returns whether anything was removed
    pub fn remove_participant(&mut self, username: &str) -> bool {
        match self.participants.iter().position(|p| p == username) {
            Some(index) => {
                self.participants.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_meeting_has_no_participants() {
        let meeting = MeetingModel::new("abc12345".to_string(), "alice".to_string());

        assert_eq!(meeting.id, "abc12345");
        assert_eq!(meeting.host, "alice");
        assert_eq!(meeting.participant_count(), 0);
        assert!(meeting.participants.is_empty());
    }

    #[test]
    fn test_remove_participant_removes_single_occurrence() {
        let mut meeting = MeetingModel::new("abc12345".to_string(), "alice".to_string());
        meeting.add_participant("bob".to_string());
        meeting.add_participant("carol".to_string());
        meeting.add_participant("bob".to_string());

        assert!(meeting.remove_participant("bob"));
        assert_eq!(meeting.participants, vec!["carol", "bob"]);

        assert!(!meeting.remove_participant("dave"));
        assert_eq!(meeting.participant_count(), 2);
    }
}
