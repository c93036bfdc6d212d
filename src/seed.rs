//! Reproducible demo data for exercising the recommender end to end.
//!
//! The featured volunteer prefers Animal Shelter and Tutoring and has
//! completed five past events at the first organization, so the hybrid branch
//! is used. A second volunteer with no history or preferences shows the
//! popularity fallback.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    data::{Event, EventStatus, EventTag, Registration, RegistrationStatus, RocksStore, Volunteer},
    errors::MatchError,
};

pub const DEMO_VOLUNTEER_ID: &str = "demo-volunteer";
pub const DEMO_NEWCOMER_ID: &str = "demo-newcomer";
pub const DEMO_ANIMAL_RESCUE: &str = "org-animal-rescue";
pub const DEMO_FOOD_BANK: &str = "org-food-bank";

const DAY: i64 = 86_400;

#[derive(Debug, Clone, Default)]
pub struct DemoDataset {
    pub events: Vec<Event>,
    pub volunteers: Vec<Volunteer>,
    pub registrations: Vec<Registration>,
}

impl DemoDataset {
    pub fn store_into(&self, store: &RocksStore) -> Result<(), MatchError> {
        for event in &self.events {
            store.put_event(event)?;
        }
        for volunteer in &self.volunteers {
            store.put_volunteer(volunteer)?;
        }
        for registration in &self.registrations {
            store.put_registration(registration)?;
        }
        Ok(())
    }
}

fn demo_event(
    id: String,
    name: &str,
    tags: &[EventTag],
    org: &str,
    status: EventStatus,
    start_time: i64,
    capacity: u32,
) -> Event {
    Event {
        id,
        name: name.to_string(),
        tags: tags.to_vec(),
        organization_id: org.to_string(),
        status,
        start_time,
        end_time: start_time + 3 * 3600,
        capacity,
    }
}

/// Build the demo dataset relative to `now` (unix seconds)
pub fn demo_dataset(now: i64, seed: u64) -> DemoDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = DemoDataset::default();

    data.volunteers.push(Volunteer::new(
        DEMO_VOLUNTEER_ID,
        &[EventTag::AnimalShelter, EventTag::Tutoring],
    ));
    data.volunteers.push(Volunteer::new(DEMO_NEWCOMER_ID, &[]));

    // Completed history at the animal rescue. Kept published so the batch
    // job indexes them; their start times keep them out of recommendations.
    let past_tags: [&[EventTag]; 5] = [
        &[EventTag::AnimalShelter],
        &[EventTag::AnimalShelter, EventTag::Tutoring],
        &[EventTag::Tutoring],
        &[EventTag::AnimalShelter],
        &[EventTag::AnimalShelter, EventTag::Tutoring],
    ];
    for (i, tags) in past_tags.iter().enumerate() {
        let id = format!("past-{}", i + 1);
        let start = now - (i as i64 + 1) * 7 * DAY;
        data.events.push(demo_event(
            id.clone(),
            "Shelter Saturday",
            tags,
            DEMO_ANIMAL_RESCUE,
            EventStatus::Published,
            start,
            20,
        ));

        let mut registration =
            Registration::new(id, DEMO_VOLUNTEER_ID, RegistrationStatus::Completed);
        registration.clock_in = Some(start);
        registration.clock_out = Some(start + 3 * 3600);
        data.registrations.push(registration);
    }

    // Upcoming events, from strong to weak matches
    let upcoming: [(&str, &[EventTag], &str); 8] = [
        ("Dog Walking Morning", &[EventTag::AnimalShelter], DEMO_ANIMAL_RESCUE),
        ("Reading Buddies", &[EventTag::AnimalShelter, EventTag::Tutoring], DEMO_ANIMAL_RESCUE),
        ("Homework Help", &[EventTag::Tutoring], DEMO_FOOD_BANK),
        ("Cat Adoption Day", &[EventTag::AnimalShelter], DEMO_FOOD_BANK),
        ("Pantry Stocking", &[EventTag::FoodPantry], DEMO_FOOD_BANK),
        ("Meal Service", &[EventTag::FoodPantry, EventTag::HomelessShelter], DEMO_FOOD_BANK),
        ("Riverbank Cleanup", &[EventTag::Cleanup], DEMO_FOOD_BANK),
        ("Park Cleanup", &[EventTag::Cleanup], DEMO_ANIMAL_RESCUE),
    ];
    for (i, (name, tags, org)) in upcoming.iter().enumerate() {
        let id = format!("upcoming-{}", i + 1);
        let capacity = rng.gen_range(5..=25);
        let start = now + (i as i64 + 1) * DAY + rng.gen_range(0..12) * 3600;
        data.events.push(demo_event(
            id.clone(),
            name,
            tags,
            org,
            EventStatus::Published,
            start,
            capacity,
        ));

        // Other volunteers fill some seats, never all of them
        let filled = rng.gen_range(0..capacity);
        for seat in 0..filled {
            data.registrations.push(Registration::new(
                id.clone(),
                format!("filler-{i}-{seat}"),
                RegistrationStatus::Upcoming,
            ));
        }
    }

    // Never recommended: not yet published
    data.events.push(demo_event(
        "draft-1".to_string(),
        "Kitten Socializing",
        &[EventTag::AnimalShelter],
        DEMO_ANIMAL_RESCUE,
        EventStatus::Draft,
        now + 3 * DAY,
        10,
    ));

    data
}
