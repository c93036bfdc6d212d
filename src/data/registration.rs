use bincode::{Decode, Encode};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Upcoming,
    Completed,
    Incomplete,
    Unregistered,
}

impl RegistrationStatus {
    /// Everything except an explicit unregistration holds a seat
    pub fn is_active(self) -> bool {
        self != RegistrationStatus::Unregistered
    }
}

/// Links one volunteer to one event
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize)]
pub struct Registration {
    pub event_id: String,
    pub volunteer_id: String,
    pub status: RegistrationStatus,
    pub clock_in: Option<i64>,  // Unix timestamp
    pub clock_out: Option<i64>, // Unix timestamp
}

impl Registration {
    pub fn new(
        event_id: impl Into<String>,
        volunteer_id: impl Into<String>,
        status: RegistrationStatus,
    ) -> Self {
        Registration {
            event_id: event_id.into(),
            volunteer_id: volunteer_id.into(),
            status,
            clock_in: None,
            clock_out: None,
        }
    }
}
