use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

use super::models::MeetingModel;
use crate::shared::AppError;

/// Trait for meeting repository operations
#[async_trait]
pub trait MeetingRepository {
    /// Stores a new meeting, refusing to overwrite an existing id
    async fn create_meeting(&self, meeting: &MeetingModel) -> Result<(), AppError>;
    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<MeetingModel>, AppError>;
    async fn meeting_exists(&self, meeting_id: &str) -> Result<bool, AppError>;
    async fn list_meetings(&self) -> Result<Vec<MeetingModel>, AppError>;

    /// Atomically appends a participant, returns the updated meeting
    async fn add_participant(
        &self,
        meeting_id: &str,
        username: &str,
    ) -> Result<MeetingModel, AppError>;

    /// Atomically removes one occurrence of a participant, returns the updated meeting
    async fn remove_participant(
        &self,
        meeting_id: &str,
        username: &str,
    ) -> Result<MeetingModel, AppError>;
}

/// In-memory implementation of MeetingRepository
pub struct InMemoryMeetingRepository {
    meetings: Mutex<HashMap<String, MeetingModel>>,
}

impl Default for InMemoryMeetingRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMeetingRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            meetings: Mutex::new(HashMap::new()),
        }
    }

    fn meetings(&self) -> MutexGuard<'_, HashMap<String, MeetingModel>> {
        self.meetings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MeetingRepository for InMemoryMeetingRepository {
    #[instrument(skip(self, meeting))]
    async fn create_meeting(&self, meeting: &MeetingModel) -> Result<(), AppError> {
        debug!(meeting_id = %meeting.id, host = %meeting.host, "Creating meeting in memory");

        let mut meetings = self.meetings();
        if meetings.contains_key(&meeting.id) {
            warn!(meeting_id = %meeting.id, "Meeting already exists in memory");
            return Err(AppError::Conflict(format!(
                "Meeting {} already exists",
                meeting.id
            )));
        }
        meetings.insert(meeting.id.clone(), meeting.clone());

        debug!(meeting_id = %meeting.id, "Meeting created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<MeetingModel>, AppError> {
        let meeting = self.meetings().get(meeting_id).cloned();

        match &meeting {
            Some(m) => debug!(meeting_id = %meeting_id, host = %m.host, "Meeting found in memory"),
            None => debug!(meeting_id = %meeting_id, "Meeting not found in memory"),
        }

        Ok(meeting)
    }

    async fn meeting_exists(&self, meeting_id: &str) -> Result<bool, AppError> {
        Ok(self.meetings().contains_key(meeting_id))
    }

    #[instrument(skip(self))]
    async fn list_meetings(&self) -> Result<Vec<MeetingModel>, AppError> {
        let meetings: Vec<MeetingModel> = self.meetings().values().cloned().collect();

        debug!(meeting_count = meetings.len(), "Meetings listed from memory");
        Ok(meetings)
    }

    #[instrument(skip(self))]
    async fn add_participant(
        &self,
        meeting_id: &str,
        username: &str,
    ) -> Result<MeetingModel, AppError> {
        let mut meetings = self.meetings();

        let meeting = meetings
            .get_mut(meeting_id)
            .ok_or_else(|| AppError::NotFound(format!("Meeting {} not found", meeting_id)))?;
        meeting.add_participant(username.to_string());

        info!(
            meeting_id = %meeting_id,
            username = %username,
            participant_count = meeting.participant_count(),
            "Participant added to meeting"
        );

        Ok(meeting.clone())
    }

    #[instrument(skip(self))]
    async fn remove_participant(
        &self,
        meeting_id: &str,
        username: &str,
    ) -> Result<MeetingModel, AppError> {
        let mut meetings = self.meetings();

        let meeting = meetings
            .get_mut(meeting_id)
            .ok_or_else(|| AppError::NotFound(format!("Meeting {} not found", meeting_id)))?;

        if !meeting.remove_participant(username) {
            debug!(meeting_id = %meeting_id, username = %username, "Participant not in meeting");
        }

        Ok(meeting.clone())
    }
}
