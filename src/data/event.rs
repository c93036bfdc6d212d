use bincode::{Decode, Encode};
use serde::Serialize;

/// Category vocabulary shared by events and volunteer preferences.
/// Declaration order defines the tag dimensions of a feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, Serialize)]
pub enum EventTag {
    #[serde(rename = "Animal Shelter")]
    AnimalShelter,
    #[serde(rename = "Homeless Shelter")]
    HomelessShelter,
    #[serde(rename = "Food Pantry")]
    FoodPantry,
    Cleanup,
    Tutoring,
}

impl EventTag {
    pub const ALL: [EventTag; 5] = [
        EventTag::AnimalShelter,
        EventTag::HomelessShelter,
        EventTag::FoodPantry,
        EventTag::Cleanup,
        EventTag::Tutoring,
    ];

    /// Position of this tag in the one-hot tag block
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Event lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Published,
    Completed,
    Cancelled,
    Draft,
    Deleted,
}

impl EventStatus {
    /// Only published events accept registrations
    pub fn is_open(self) -> bool {
        self == EventStatus::Published
    }

    /// Whether the event's similarity row survives it leaving the batch
    /// window. Completed events keep theirs as collaborative history.
    pub fn keeps_history(self) -> bool {
        matches!(self, EventStatus::Published | EventStatus::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub tags: Vec<EventTag>,
    pub organization_id: String,
    pub status: EventStatus,
    pub start_time: i64, // Unix timestamp
    pub end_time: i64,   // Unix timestamp
    pub capacity: u32,   // maximum number of volunteers
}

impl Event {
    pub fn has_tag(&self, tag: EventTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Result order of an [`EventQuery`]; ties always fall back to id ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOrder {
    /// Start time ascending
    #[default]
    StartAscending,
    /// Events starting after `now` soonest first, then the rest most recent
    /// first
    UpcomingFirst { now: i64 },
}

/// Typed filter for catalog lookups.
///
/// Results are sorted by `order`, then truncated to `limit`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub statuses: Vec<EventStatus>,
    /// Keep only events starting strictly after this instant
    pub starts_after: Option<i64>,
    pub order: EventOrder,
    pub limit: usize,
}

impl EventQuery {
    pub fn publishable(limit: usize) -> Self {
        Self {
            statuses: vec![EventStatus::Published],
            starts_after: None,
            order: EventOrder::StartAscending,
            limit,
        }
    }

    pub fn starting_after(mut self, instant: i64) -> Self {
        self.starts_after = Some(instant);
        self
    }

    pub fn upcoming_first(mut self, now: i64) -> Self {
        self.order = EventOrder::UpcomingFirst { now };
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&event.status))
            && self.starts_after.is_none_or(|t| event.start_time > t)
    }

    /// Filter, order and truncate an arbitrary set of events
    pub fn apply(&self, events: impl IntoIterator<Item = Event>) -> Vec<Event> {
        let mut found: Vec<Event> = events.into_iter().filter(|e| self.matches(e)).collect();
        match self.order {
            EventOrder::StartAscending => found.sort_by(|a, b| {
                a.start_time
                    .cmp(&b.start_time)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            EventOrder::UpcomingFirst { now } => found.sort_by(|a, b| {
                let (a_past, b_past) = (a.start_time <= now, b.start_time <= now);
                a_past
                    .cmp(&b_past)
                    .then_with(|| {
                        if a_past {
                            b.start_time.cmp(&a.start_time)
                        } else {
                            a.start_time.cmp(&b.start_time)
                        }
                    })
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }
        found.truncate(self.limit);
        found
    }
}
