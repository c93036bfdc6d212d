use std::collections::{BTreeSet, HashSet};

use dashmap::DashMap;

use crate::{
    data::{
        EventCatalog, RegistrationLedger, SimilarityStore, VolunteerDirectory,
        event::{Event, EventQuery},
        registration::{Registration, RegistrationStatus},
        similarity::EventSimilarity,
        volunteer::Volunteer,
    },
    errors::MatchError,
};

/// In-process store backed by concurrent maps.
///
/// Implements the same traits as [`RocksStore`](crate::data::RocksStore);
/// handy for tests and for callers that already hold their data in memory.
#[derive(Default)]
pub struct MemoryStore {
    events: DashMap<String, Event>,
    volunteers: DashMap<String, Volunteer>,
    registrations: DashMap<(String, String), Registration>, // (event, volunteer)
    similarities: DashMap<String, EventSimilarity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_event(&self, event: Event) {
        self.events.insert(event.id.clone(), event);
    }

    pub fn put_volunteer(&self, volunteer: Volunteer) {
        self.volunteers.insert(volunteer.id.clone(), volunteer);
    }

    pub fn put_registration(&self, registration: Registration) {
        let key = (
            registration.event_id.clone(),
            registration.volunteer_id.clone(),
        );
        self.registrations.insert(key, registration);
    }

    fn registrations_where(&self, keep: impl Fn(&Registration) -> bool) -> Vec<Registration> {
        self.registrations
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl EventCatalog for MemoryStore {
    fn get_event(&self, event_id: &str) -> Result<Option<Event>, MatchError> {
        Ok(self.events.get(event_id).map(|e| e.value().clone()))
    }

    fn find_events(&self, query: &EventQuery) -> Result<Vec<Event>, MatchError> {
        let events: Vec<Event> = self.events.iter().map(|e| e.value().clone()).collect();
        Ok(query.apply(events))
    }
}

impl RegistrationLedger for MemoryStore {
    fn completed_event_ids(&self, volunteer_id: &str) -> Result<BTreeSet<String>, MatchError> {
        Ok(self
            .registrations_where(|r| {
                r.volunteer_id == volunteer_id && r.status == RegistrationStatus::Completed
            })
            .into_iter()
            .map(|r| r.event_id)
            .collect())
    }

    fn active_event_ids(&self, volunteer_id: &str) -> Result<HashSet<String>, MatchError> {
        Ok(self
            .registrations_where(|r| r.volunteer_id == volunteer_id && r.status.is_active())
            .into_iter()
            .map(|r| r.event_id)
            .collect())
    }

    fn active_registration_count(&self, event_id: &str) -> Result<u32, MatchError> {
        let count = self
            .registrations
            .iter()
            .filter(|entry| entry.value().event_id == event_id && entry.value().status.is_active())
            .count();
        Ok(count as u32)
    }
}

impl VolunteerDirectory for MemoryStore {
    fn get_volunteer(&self, volunteer_id: &str) -> Result<Option<Volunteer>, MatchError> {
        Ok(self.volunteers.get(volunteer_id).map(|v| v.value().clone()))
    }
}

impl SimilarityStore for MemoryStore {
    fn get(&self, event_id: &str) -> Result<Option<EventSimilarity>, MatchError> {
        Ok(self.similarities.get(event_id).map(|r| r.value().clone()))
    }

    fn upsert(&self, row: &EventSimilarity) -> Result<(), MatchError> {
        self.similarities.insert(row.event_id.clone(), row.clone());
        Ok(())
    }

    fn remove(&self, event_id: &str) -> Result<(), MatchError> {
        self.similarities.remove(event_id);
        Ok(())
    }

    fn indexed_event_ids(&self) -> Result<Vec<String>, MatchError> {
        let mut ids: Vec<String> = self.similarities.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}
