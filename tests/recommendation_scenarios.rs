use std::{collections::HashMap, sync::Arc};

use tempdir::TempDir;
use volmatch::{
    BuildOutcome, Event, EventStatus, EventTag, RecommendConfig, Recommender, Registration,
    RegistrationStatus, RocksStore, SimilarityBuilder, SimilarityStore, Strategy, Volunteer,
    seed::{self, DEMO_NEWCOMER_ID, DEMO_VOLUNTEER_ID},
};

const NOW: i64 = 1_760_000_000;
const DAY: i64 = 86_400;

type RocksRecommender = Recommender<RocksStore, RocksStore, RocksStore, RocksStore>;

fn open_temp() -> (TempDir, Arc<RocksStore>) {
    let temp_dir = TempDir::new("volmatch_scenarios").expect("Failed to create temp dir");
    let store = RocksStore::open(temp_dir.path()).expect("Failed to open RocksDB");
    (temp_dir, Arc::new(store))
}

fn builder(store: &Arc<RocksStore>) -> SimilarityBuilder<RocksStore, RocksStore> {
    SimilarityBuilder::new(store.clone(), store.clone(), RecommendConfig::default())
}

fn recommender(store: &Arc<RocksStore>) -> RocksRecommender {
    Recommender::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        RecommendConfig::default(),
    )
}

fn event(id: &str, tags: &[EventTag], org: &str, start_time: i64, capacity: u32) -> Event {
    Event {
        id: id.to_string(),
        name: id.to_string(),
        tags: tags.to_vec(),
        organization_id: org.to_string(),
        status: EventStatus::Published,
        start_time,
        end_time: start_time + 7200,
        capacity,
    }
}

fn ranked_ids(store: &Arc<RocksStore>, volunteer_id: &str) -> Vec<String> {
    recommender(store)
        .recommend_at(volunteer_id, NOW)
        .unwrap()
        .recommendations
        .into_iter()
        .map(|r| r.event.id)
        .collect()
}

/// Canonical order, no self edges, threshold respected, every edge mirrored
fn assert_index_invariants(store: &RocksStore) {
    let mut scores: HashMap<(String, String), f64> = HashMap::new();
    for id in store.indexed_event_ids().unwrap() {
        let row = store.get(&id).unwrap().unwrap();
        for pair in row.neighbors.windows(2) {
            let ordered = pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].event_id < pair[1].event_id);
            assert!(ordered, "row {id} is not in canonical order");
        }
        for n in &row.neighbors {
            assert_ne!(n.event_id, id, "row {id} lists itself");
            assert!(n.score >= 0.7, "row {id} stores {} below threshold", n.score);
            scores.insert((id.clone(), n.event_id.clone()), n.score);
        }
    }

    for ((a, b), score) in &scores {
        let reverse = scores.get(&(b.clone(), a.clone()));
        assert_eq!(reverse, Some(score), "edge {a}->{b} is not mirrored");
    }
}

#[test]
fn test_identical_events_score_one_end_to_end() {
    let (_dir, store) = open_temp();
    store
        .put_event(&event("E1", &[EventTag::Tutoring], "O1", NOW + DAY, 10))
        .unwrap();
    store
        .put_event(&event("E2", &[EventTag::Tutoring], "O1", NOW + 2 * DAY, 10))
        .unwrap();
    store
        .put_volunteer(&Volunteer::new("V", &[EventTag::Tutoring]))
        .unwrap();
    store
        .put_registration(&Registration::new("E1", "V", RegistrationStatus::Completed))
        .unwrap();

    builder(&store).rebuild_all().unwrap();

    let e1 = store.get("E1").unwrap().unwrap();
    let e2 = store.get("E2").unwrap().unwrap();
    assert!((e1.score_for("E2").unwrap() - 1.0).abs() < 1e-9);
    assert!((e2.score_for("E1").unwrap() - 1.0).abs() < 1e-9);

    let set = recommender(&store).recommend_at("V", NOW).unwrap();
    assert_eq!(set.strategy, Strategy::Hybrid);
    assert_eq!(set.recommendations.len(), 1);
    assert_eq!(set.recommendations[0].event.id, "E2");
    assert!((set.recommendations[0].score - 1.0).abs() < 1e-9);
}

#[test]
fn test_preferences_without_history_only_see_overlap() {
    let (_dir, store) = open_temp();
    store
        .put_event(&event("tutoring", &[EventTag::Tutoring], "O1", NOW + DAY, 10))
        .unwrap();
    store
        .put_event(&event(
            "mixed",
            &[EventTag::Cleanup, EventTag::Tutoring],
            "O2",
            NOW + DAY,
            10,
        ))
        .unwrap();
    store
        .put_volunteer(&Volunteer::new("V", &[EventTag::Cleanup]))
        .unwrap();

    let set = recommender(&store).recommend_at("V", NOW).unwrap();
    assert_eq!(set.strategy, Strategy::ContentOnly);
    assert_eq!(set.recommendations.len(), 1);
    assert_eq!(set.recommendations[0].event.id, "mixed");
    assert_eq!(set.recommendations[0].score, 1.0);
}

#[test]
fn test_ineligible_events_never_recommended() {
    let (_dir, store) = open_temp();
    store
        .put_event(&event("ok", &[EventTag::FoodPantry], "O1", NOW + DAY, 2))
        .unwrap();
    store
        .put_event(&event("full", &[EventTag::FoodPantry], "O1", NOW + DAY, 1))
        .unwrap();
    store
        .put_event(&event("past", &[EventTag::FoodPantry], "O1", NOW - DAY, 5))
        .unwrap();
    store
        .put_event(&event("mine", &[EventTag::FoodPantry], "O1", NOW + DAY, 5))
        .unwrap();
    let mut draft = event("draft", &[EventTag::FoodPantry], "O1", NOW + DAY, 5);
    draft.status = EventStatus::Draft;
    store.put_event(&draft).unwrap();

    store.put_volunteer(&Volunteer::new("V", &[])).unwrap();
    store
        .put_registration(&Registration::new("full", "W", RegistrationStatus::Upcoming))
        .unwrap();
    store
        .put_registration(&Registration::new("mine", "V", RegistrationStatus::Upcoming))
        .unwrap();

    assert_eq!(ranked_ids(&store, "V"), vec!["ok"]);
}

#[test]
fn test_demo_dataset_index_invariants() {
    let (_dir, store) = open_temp();
    seed::demo_dataset(NOW, 42).store_into(&store).unwrap();

    let BuildOutcome::Completed(report) = builder(&store).rebuild_all().unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(report.rows_pruned, 0);

    assert_index_invariants(&store);

    // The draft is never indexed
    assert!(store.get("draft-1").unwrap().is_none());
}

#[test]
fn test_demo_volunteers_use_expected_strategies() {
    let (_dir, store) = open_temp();
    seed::demo_dataset(NOW, 42).store_into(&store).unwrap();
    builder(&store).rebuild_all().unwrap();

    let rec = recommender(&store);
    let featured = rec.recommend_at(DEMO_VOLUNTEER_ID, NOW).unwrap();
    assert_eq!(featured.strategy, Strategy::Hybrid);
    assert!(!featured.recommendations.is_empty());
    assert!(
        featured
            .recommendations
            .iter()
            .all(|r| r.event.id.starts_with("upcoming-"))
    );
    // Same tags and organizer as the completed history
    assert_eq!(featured.recommendations[0].event.id, "upcoming-2");

    let newcomer = rec.recommend_at(DEMO_NEWCOMER_ID, NOW).unwrap();
    assert_eq!(newcomer.strategy, Strategy::Popularity);
    assert_eq!(newcomer.total_recommendations, 8);
    for pair in newcomer.recommendations.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    // Repeated scoring is bit-identical
    let again = rec.recommend_at(DEMO_NEWCOMER_ID, NOW).unwrap();
    assert_eq!(newcomer, again);
}

#[test]
fn test_publish_trigger_keeps_index_symmetric() {
    let (_dir, store) = open_temp();
    store
        .put_event(&event("a", &[EventTag::Cleanup], "O1", NOW + DAY, 5))
        .unwrap();
    store
        .put_event(&event("b", &[EventTag::Tutoring], "O2", NOW + DAY, 5))
        .unwrap();
    builder(&store).rebuild_all().unwrap();

    // A new event is published that matches "a"
    store
        .put_event(&event("c", &[EventTag::Cleanup], "O1", NOW + DAY, 5))
        .unwrap();
    builder(&store).rebuild_for_event("c").unwrap();

    let a = store.neighbors("a").unwrap();
    let c = store.neighbors("c").unwrap();
    assert_eq!(a.len(), 1);
    assert_eq!(c.len(), 1);
    assert_eq!(a[0].event_id, "c");
    assert_eq!(c[0].event_id, "a");
    assert_eq!(a[0].score.to_bits(), c[0].score.to_bits());
    assert!(store.neighbors("b").unwrap().is_empty());
}

#[test]
fn test_completed_history_still_drives_hybrid_scores() {
    let (_dir, store) = open_temp();
    for id in ["shift-1", "shift-2"] {
        store
            .put_event(&event(id, &[EventTag::Tutoring], "O1", NOW - 7 * DAY, 10))
            .unwrap();
    }
    store
        .put_event(&event("match", &[EventTag::Tutoring], "O1", NOW + DAY, 10))
        .unwrap();
    store
        .put_event(&event("other", &[EventTag::Cleanup], "O2", NOW + DAY, 10))
        .unwrap();
    store
        .put_volunteer(&Volunteer::new("V", &[EventTag::Tutoring]))
        .unwrap();

    // Indexed while everything was still open
    builder(&store).rebuild_all_at(NOW - 8 * DAY).unwrap();

    // The shifts take place, are marked completed, then the nightly run follows
    for id in ["shift-1", "shift-2"] {
        let mut done = event(id, &[EventTag::Tutoring], "O1", NOW - 7 * DAY, 10);
        done.status = EventStatus::Completed;
        store.put_event(&done).unwrap();
        store
            .put_registration(&Registration::new(id, "V", RegistrationStatus::Completed))
            .unwrap();
    }
    let BuildOutcome::Completed(report) = builder(&store).rebuild_all_at(NOW).unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(report.total_events, 2);
    assert_eq!(report.rows_pruned, 0);

    let history = store.get("shift-1").unwrap().expect("history row kept");
    assert!(history.score_for("match").is_some());
    assert_index_invariants(&store);

    let set = recommender(&store).recommend_at("V", NOW).unwrap();
    assert_eq!(set.strategy, Strategy::Hybrid);
    assert_eq!(set.recommendations[0].event.id, "match");
    assert!((set.recommendations[0].score - 1.0).abs() < 1e-9);
    assert_eq!(set.recommendations[1].event.id, "other");
    assert_eq!(set.recommendations[1].score, 0.0);
}
