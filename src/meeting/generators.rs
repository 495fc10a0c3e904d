use rand::{distr::Alphanumeric, Rng};

pub const DEFAULT_MEETING_ID_LENGTH: usize = 8;

/// Trait for generating meeting identifiers
///
/// Generators only need to make collisions unlikely; uniqueness is enforced
/// by `MeetingService`, which regenerates on collision.
pub trait MeetingIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random alphanumeric identifiers, 62 possible characters per position
pub struct RandomMeetingIdGenerator {
    length: usize,
}

impl RandomMeetingIdGenerator {
    pub fn new() -> Self {
        Self::with_length(DEFAULT_MEETING_ID_LENGTH)
    }

    pub fn with_length(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomMeetingIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MeetingIdGenerator for RandomMeetingIdGenerator {
    fn generate(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }
}

/// Pet name-based identifiers such as `brave-otter`
pub struct PetnameMeetingIdGenerator;

impl PetnameMeetingIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PetnameMeetingIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MeetingIdGenerator for PetnameMeetingIdGenerator {
    fn generate(&self) -> String {
        petname::Petnames::default().generate_one(2, "-")
    }
}
