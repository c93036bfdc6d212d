use std::collections::{BTreeSet, HashSet};

use crate::errors::MatchError;

mod db;
mod event;
mod memory;
mod registration;
mod similarity;
mod volunteer;

pub use db::RocksStore;
pub use event::{Event, EventOrder, EventQuery, EventStatus, EventTag};
pub use memory::MemoryStore;
pub use registration::{Registration, RegistrationStatus};
pub use similarity::{EventSimilarity, Neighbor, neighbor_order};
pub use volunteer::Volunteer;

/// Read access to events
pub trait EventCatalog {
    fn get_event(&self, event_id: &str) -> Result<Option<Event>, MatchError>;

    fn find_events(&self, query: &EventQuery) -> Result<Vec<Event>, MatchError>;

    /// Events currently open for registration, capped at `limit`. Events
    /// starting after `now` are kept first so new ones never fall out of the
    /// window behind past ones.
    fn publishable_events(&self, limit: usize, now: i64) -> Result<Vec<Event>, MatchError> {
        self.find_events(&EventQuery::publishable(limit).upcoming_first(now))
    }
}

/// Read access to volunteer/event registrations
pub trait RegistrationLedger {
    /// Events the volunteer has completed, in id order
    fn completed_event_ids(&self, volunteer_id: &str) -> Result<BTreeSet<String>, MatchError>;

    /// Events the volunteer holds any non-unregistered registration for
    fn active_event_ids(&self, volunteer_id: &str) -> Result<HashSet<String>, MatchError>;

    /// Number of non-unregistered registrations for an event
    fn active_registration_count(&self, event_id: &str) -> Result<u32, MatchError>;
}

pub trait VolunteerDirectory {
    fn get_volunteer(&self, volunteer_id: &str) -> Result<Option<Volunteer>, MatchError>;
}

/// Persisted event -> neighbor list index.
///
/// Every write replaces one row atomically; there is no merge and no
/// cross-row transaction.
pub trait SimilarityStore {
    fn get(&self, event_id: &str) -> Result<Option<EventSimilarity>, MatchError>;

    /// Full overwrite of the row keyed by `row.event_id`
    fn upsert(&self, row: &EventSimilarity) -> Result<(), MatchError>;

    fn remove(&self, event_id: &str) -> Result<(), MatchError>;

    /// Ids of every event that currently has a stored row
    fn indexed_event_ids(&self) -> Result<Vec<String>, MatchError>;

    /// Stored neighbor list, empty when the event has no row
    fn neighbors(&self, event_id: &str) -> Result<Vec<Neighbor>, MatchError> {
        Ok(self
            .get(event_id)?
            .map(|row| row.neighbors)
            .unwrap_or_default())
    }
}
