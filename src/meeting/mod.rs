// Public API - what other modules can use
pub use generators::{MeetingIdGenerator, PetnameMeetingIdGenerator, RandomMeetingIdGenerator};
pub use handlers::{create_meeting, get_meeting, list_meetings};
pub use service::{MeetingService, Participation};

// Internal modules
pub mod generators;
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
