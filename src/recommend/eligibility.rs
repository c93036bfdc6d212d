use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::{
    data::{Event, RegistrationLedger},
    errors::MatchError,
};

/// An event that may be recommended right now, with its current fill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub event: Event,
    pub active_registrations: u32,
}

impl Candidate {
    /// Registration fill ratio, 0 for events without capacity
    pub fn fill_ratio(&self) -> f64 {
        if self.event.capacity == 0 {
            return 0.0;
        }
        self.active_registrations as f64 / self.event.capacity as f64
    }
}

/// Why an event was kept out of the candidate set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    AlreadyRegistered,
    AlreadyStarted,
    NotOpen,
    Full,
}

/// Checks that need no registration counts
pub fn precheck(event: &Event, registered: &HashSet<String>, now: i64) -> Result<(), Ineligible> {
    if registered.contains(&event.id) {
        return Err(Ineligible::AlreadyRegistered);
    }
    if event.start_time <= now {
        return Err(Ineligible::AlreadyStarted);
    }
    if !event.status.is_open() {
        return Err(Ineligible::NotOpen);
    }
    Ok(())
}

pub fn has_room(event: &Event, active_registrations: u32) -> Result<(), Ineligible> {
    if active_registrations >= event.capacity {
        return Err(Ineligible::Full);
    }
    Ok(())
}

/// Reduce `pool` to the events `volunteer_id` may register for at `now`.
///
/// Pool order is preserved.
pub fn eligible_candidates<L: RegistrationLedger>(
    ledger: &L,
    volunteer_id: &str,
    pool: Vec<Event>,
    now: i64,
) -> Result<Vec<Candidate>, MatchError> {
    let registered = ledger.active_event_ids(volunteer_id)?;

    let mut candidates = Vec::with_capacity(pool.len());
    for event in pool {
        if let Err(reason) = precheck(&event, &registered, now) {
            debug!(event_id = %event.id, ?reason, "Event not eligible");
            continue;
        }

        let active_registrations = ledger.active_registration_count(&event.id)?;
        if let Err(reason) = has_room(&event, active_registrations) {
            debug!(event_id = %event.id, ?reason, "Event not eligible");
            continue;
        }

        candidates.push(Candidate {
            event,
            active_registrations,
        });
    }

    Ok(candidates)
}
