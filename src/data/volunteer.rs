use bincode::{Decode, Encode};
use serde::Serialize;

use crate::data::event::EventTag;

#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize)]
pub struct Volunteer {
    pub id: String,
    pub preferences: Vec<EventTag>, // ordered, no duplicates
    pub active: bool,
}

impl Volunteer {
    /// Create an active volunteer, dropping repeated preference tags
    /// while keeping the order they were first given in.
    pub fn new(id: impl Into<String>, preferences: &[EventTag]) -> Self {
        let mut deduped = Vec::with_capacity(preferences.len());
        for tag in preferences {
            if !deduped.contains(tag) {
                deduped.push(*tag);
            }
        }

        Volunteer {
            id: id.into(),
            preferences: deduped,
            active: true,
        }
    }
}
