use std::{
    collections::{BTreeSet, HashSet},
    path::Path,
    sync::Arc,
};

use bincode::{
    Decode, Encode,
    config::{self},
};
use rocksdb::{DB, Direction, IteratorMode, Options, WriteBatch};
use tracing::debug;

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

// Key layout. Ids must not contain ':'.
const EVENT_PREFIX: &str = "event:";
const VOLUNTEER_PREFIX: &str = "volunteer:";
const REGISTRATION_PREFIX: &str = "registration:"; // registration:{event}:{volunteer}
const VOLUNTEER_REGISTRATION_PREFIX: &str = "volunteer_registration:"; // ...:{volunteer}:{event}
const SIMILARITY_PREFIX: &str = "similarity:";

// Configure RocksDB options
fn rocksdb_options() -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts
}

/// RocksDB-backed implementation of every collaborator trait.
///
/// Cloning is cheap and clones share the same database handle.
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MatchError> {
        let db = DB::open(&rocksdb_options(), path)?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn put_event(&self, event: &Event) -> Result<(), MatchError> {
        self.put_record(&format!("{EVENT_PREFIX}{}", event.id), event)
    }

    pub fn put_volunteer(&self, volunteer: &Volunteer) -> Result<(), MatchError> {
        self.put_record(&format!("{VOLUNTEER_PREFIX}{}", volunteer.id), volunteer)
    }

    /// Store a registration under both its event and volunteer keys in one
    /// atomic batch, replacing any earlier registration for the same pair.
    pub fn put_registration(&self, registration: &Registration) -> Result<(), MatchError> {
        let value = encode(registration)?;
        let by_event = format!(
            "{REGISTRATION_PREFIX}{}:{}",
            registration.event_id, registration.volunteer_id
        );
        let by_volunteer = format!(
            "{VOLUNTEER_REGISTRATION_PREFIX}{}:{}",
            registration.volunteer_id, registration.event_id
        );

        let mut batch = WriteBatch::default();
        batch.put(by_event.as_bytes(), &value);
        batch.put(by_volunteer.as_bytes(), &value);
        self.db.write(batch)?;

        Ok(())
    }

    fn put_record<T: Encode>(&self, key: &str, value: &T) -> Result<(), MatchError> {
        let value = encode(value)?;
        self.db.put(key.as_bytes(), &value)?;
        Ok(())
    }

    fn get_record<T: Decode<()>>(&self, key: &str) -> Result<Option<T>, MatchError> {
        match self.db.get(key.as_bytes())? {
            Some(v) => Ok(Some(decode(&v)?)),
            None => Ok(None),
        }
    }

    /// Decode every record whose key starts with `prefix`, in key order
    fn scan_prefix<T: Decode<()>>(&self, prefix: &str) -> Result<Vec<(String, T)>, MatchError> {
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        let mut records = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let key = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
            records.push((key, decode(&value)?));
        }

        Ok(records)
    }

    fn volunteer_registrations(&self, volunteer_id: &str) -> Result<Vec<Registration>, MatchError> {
        let prefix = format!("{VOLUNTEER_REGISTRATION_PREFIX}{volunteer_id}:");
        Ok(self
            .scan_prefix::<Registration>(&prefix)?
            .into_iter()
            .map(|(_, r)| r)
            .collect())
    }
}

impl EventCatalog for RocksStore {
    fn get_event(&self, event_id: &str) -> Result<Option<Event>, MatchError> {
        self.get_record(&format!("{EVENT_PREFIX}{event_id}"))
    }

    fn find_events(&self, query: &EventQuery) -> Result<Vec<Event>, MatchError> {
        let events = self.scan_prefix::<Event>(EVENT_PREFIX)?;
        Ok(query.apply(events.into_iter().map(|(_, e)| e)))
    }
}

impl RegistrationLedger for RocksStore {
    fn completed_event_ids(&self, volunteer_id: &str) -> Result<BTreeSet<String>, MatchError> {
        Ok(self
            .volunteer_registrations(volunteer_id)?
            .into_iter()
            .filter(|r| r.status == RegistrationStatus::Completed)
            .map(|r| r.event_id)
            .collect())
    }

    fn active_event_ids(&self, volunteer_id: &str) -> Result<HashSet<String>, MatchError> {
        Ok(self
            .volunteer_registrations(volunteer_id)?
            .into_iter()
            .filter(|r| r.status.is_active())
            .map(|r| r.event_id)
            .collect())
    }

    fn active_registration_count(&self, event_id: &str) -> Result<u32, MatchError> {
        let prefix = format!("{REGISTRATION_PREFIX}{event_id}:");
        let count = self
            .scan_prefix::<Registration>(&prefix)?
            .iter()
            .filter(|(_, r)| r.status.is_active())
            .count();
        Ok(count as u32)
    }
}

impl VolunteerDirectory for RocksStore {
    fn get_volunteer(&self, volunteer_id: &str) -> Result<Option<Volunteer>, MatchError> {
        self.get_record(&format!("{VOLUNTEER_PREFIX}{volunteer_id}"))
    }
}

impl SimilarityStore for RocksStore {
    fn get(&self, event_id: &str) -> Result<Option<EventSimilarity>, MatchError> {
        self.get_record(&format!("{SIMILARITY_PREFIX}{event_id}"))
    }

    fn upsert(&self, row: &EventSimilarity) -> Result<(), MatchError> {
        debug!(
            event_id = %row.event_id,
            neighbors = row.neighbors.len(),
            "Writing similarity row"
        );
        self.put_record(&format!("{SIMILARITY_PREFIX}{}", row.event_id), row)
    }

    fn remove(&self, event_id: &str) -> Result<(), MatchError> {
        self.db
            .delete(format!("{SIMILARITY_PREFIX}{event_id}").as_bytes())?;
        Ok(())
    }

    fn indexed_event_ids(&self) -> Result<Vec<String>, MatchError> {
        Ok(self
            .scan_prefix::<EventSimilarity>(SIMILARITY_PREFIX)?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }
}

/// Encode a record to a byte vector using bincode
fn encode<T: Encode>(value: &T) -> Result<Vec<u8>, MatchError> {
    let config = config::standard();
    let encoded: Vec<u8> = bincode::encode_to_vec(value, config)?;

    Ok(encoded)
}

/// Decode a record from a byte slice
fn decode<T: Decode<()>>(bytes: &[u8]) -> Result<T, MatchError> {
    let config = config::standard();
    let (decoded, _): (T, _) = bincode::decode_from_slice(bytes, config)?;

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EventStatus, EventTag, Neighbor};
    use tempdir::TempDir;

    fn open_temp() -> (TempDir, RocksStore) {
        let temp_dir = TempDir::new("volmatch_db").expect("Failed to create temp dir");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open RocksDB in temp dir");
        (temp_dir, store)
    }

    fn event(id: &str, status: EventStatus, start_time: i64) -> Event {
        Event {
            id: id.to_string(),
            name: format!("Event {id}"),
            tags: vec![EventTag::Tutoring, EventTag::Cleanup],
            organization_id: "org-1".to_string(),
            status,
            start_time,
            end_time: start_time + 7200,
            capacity: 12,
        }
    }

    #[test]
    fn test_event_round_trip_and_query() {
        let (_dir, store) = open_temp();
        store.put_event(&event("e2", EventStatus::Published, 200)).unwrap();
        store.put_event(&event("e1", EventStatus::Published, 100)).unwrap();
        store.put_event(&event("e3", EventStatus::Draft, 50)).unwrap();

        let loaded = store.get_event("e1").unwrap().expect("event should exist");
        assert_eq!(loaded, event("e1", EventStatus::Published, 100));
        assert!(store.get_event("missing").unwrap().is_none());

        let ids: Vec<String> = store
            .publishable_events(10, 0)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["e1", "e2"]);
    }

    #[test]
    fn test_registration_views() {
        let (_dir, store) = open_temp();
        store
            .put_registration(&Registration::new("e1", "v1", RegistrationStatus::Completed))
            .unwrap();
        store
            .put_registration(&Registration::new("e2", "v1", RegistrationStatus::Upcoming))
            .unwrap();
        store
            .put_registration(&Registration::new("e3", "v1", RegistrationStatus::Unregistered))
            .unwrap();
        store
            .put_registration(&Registration::new("e2", "v2", RegistrationStatus::Incomplete))
            .unwrap();

        let completed = store.completed_event_ids("v1").unwrap();
        assert_eq!(completed.into_iter().collect::<Vec<_>>(), vec!["e1"]);

        let active = store.active_event_ids("v1").unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.contains("e1") && active.contains("e2"));

        assert_eq!(store.active_registration_count("e2").unwrap(), 2);
        assert_eq!(store.active_registration_count("e3").unwrap(), 0);

        // Re-registering the same pair replaces the earlier record
        store
            .put_registration(&Registration::new("e2", "v2", RegistrationStatus::Unregistered))
            .unwrap();
        assert_eq!(store.active_registration_count("e2").unwrap(), 1);
    }

    #[test]
    fn test_similarity_rows() {
        let (_dir, store) = open_temp();
        let row = EventSimilarity {
            event_id: "e1".into(),
            neighbors: vec![Neighbor {
                event_id: "e2".into(),
                score: 0.91,
            }],
            last_updated: 1_700_000_000,
        };

        assert!(store.neighbors("e1").unwrap().is_empty());
        store.upsert(&row).unwrap();
        assert_eq!(store.get("e1").unwrap(), Some(row.clone()));

        // Upsert overwrites instead of merging
        let replaced = EventSimilarity {
            neighbors: vec![],
            ..row
        };
        store.upsert(&replaced).unwrap();
        assert!(store.neighbors("e1").unwrap().is_empty());
        assert_eq!(store.indexed_event_ids().unwrap(), vec!["e1"]);

        store.remove("e1").unwrap();
        assert!(store.get("e1").unwrap().is_none());
        assert!(store.indexed_event_ids().unwrap().is_empty());
    }

    #[test]
    fn test_decode_invalid_data() {
        let invalid_data = vec![0xFF, 0xFF, 0xFF];
        let result = decode::<Event>(&invalid_data);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_empty_data() {
        let result = decode::<EventSimilarity>(&[]);
        assert!(result.is_err());
    }
}
