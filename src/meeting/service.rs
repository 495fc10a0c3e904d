use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    generators::MeetingIdGenerator,
    models::MeetingModel,
    repository::MeetingRepository,
    types::{MeetingCreateRequest, MeetingCreateResponse},
};
use crate::shared::AppError;

/// Upper bound on id regeneration when a generated id is already taken
const MAX_ID_ATTEMPTS: usize = 16;

/// Service for handling meeting business logic
pub struct MeetingService {
    repository: Arc<dyn MeetingRepository + Send + Sync>,
    id_generator: Arc<dyn MeetingIdGenerator>,
}

impl MeetingService {
    pub fn new(
        repository: Arc<dyn MeetingRepository + Send + Sync>,
        id_generator: Arc<dyn MeetingIdGenerator>,
    ) -> Self {
        Self {
            repository,
            id_generator,
        }
    }

    /// Creates a new meeting under an identifier that is not in use yet
    #[instrument(skip(self))]
    pub async fn create_meeting(
        &self,
        request: MeetingCreateRequest,
    ) -> Result<MeetingCreateResponse, AppError> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let meeting = MeetingModel::new(self.id_generator.generate(), request.host.clone());
            debug!(meeting_id = %meeting.id, attempt, "Generated meeting ID");

            match self.repository.create_meeting(&meeting).await {
                Ok(()) => {
                    info!(
                        meeting_id = %meeting.id,
                        host = %meeting.host,
                        "Meeting created successfully"
                    );
                    return Ok(MeetingCreateResponse {
                        meeting_id: meeting.id,
                    });
                }
                Err(AppError::Conflict(_)) => {
                    warn!(meeting_id = %meeting.id, attempt, "Meeting ID collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            attempts = MAX_ID_ATTEMPTS,
            "Could not find an unused meeting ID"
        );
        Err(AppError::Internal)
    }

    pub async fn meeting_exists(&self, meeting_id: &str) -> Result<bool, AppError> {
        self.repository.meeting_exists(meeting_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_meeting(&self, meeting_id: &str) -> Result<MeetingModel, AppError> {
        self.repository
            .get_meeting(meeting_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Meeting {} not found", meeting_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_meetings(&self) -> Result<Vec<MeetingModel>, AppError> {
        let meetings = self.repository.list_meetings().await?;
        debug!(meeting_count = meetings.len(), "Meetings retrieved");
        Ok(meetings)
    }

    /// Records a participant who has just joined over a live connection
    pub async fn join_meeting(
        &self,
        meeting_id: &str,
        username: &str,
    ) -> Result<MeetingModel, AppError> {
        self.repository.add_participant(meeting_id, username).await
    }

    /// Forgets a participant whose connection has closed
    pub async fn leave_meeting(
        &self,
        meeting_id: &str,
        username: &str,
    ) -> Result<MeetingModel, AppError> {
        self.repository.remove_participant(meeting_id, username).await
    }
}

/// Keeps a username in a meeting's participant list while its connection lives.
///
/// Leaving happens exactly once: through `leave` or, if the owning task panics
/// or is cancelled, from a task spawned on drop.
pub struct Participation {
    service: Arc<MeetingService>,
    meeting_id: String,
    username: String,
    left: bool,
}

impl Participation {
    pub async fn join(service: Arc<MeetingService>, meeting_id: &str, username: &str) -> Self {
        if let Err(e) = service.join_meeting(meeting_id, username).await {
            warn!(meeting_id = %meeting_id, error = %e, "Failed to record participant");
        }
        Self {
            service,
            meeting_id: meeting_id.to_string(),
            username: username.to_string(),
            left: false,
        }
    }

    pub async fn leave(mut self) {
        self.left = true;
        remove_participant(&self.service, &self.meeting_id, &self.username).await;
    }
}

impl Drop for Participation {
    fn drop(&mut self) {
        if self.left {
            return;
        }

        let service = self.service.clone();
        let meeting_id = std::mem::take(&mut self.meeting_id);
        let username = std::mem::take(&mut self.username);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    remove_participant(&service, &meeting_id, &username).await;
                });
            }
            Err(_) => {
                warn!(
                    meeting_id = %meeting_id,
                    username = %username,
                    "No runtime available, participant not removed"
                );
            }
        }
    }
}

async fn remove_participant(service: &MeetingService, meeting_id: &str, username: &str) {
    if let Err(e) = service.leave_meeting(meeting_id, username).await {
        warn!(meeting_id = %meeting_id, error = %e, "Failed to remove participant");
    }
}
