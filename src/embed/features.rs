use std::collections::BTreeSet;

use crate::data::{Event, EventTag};

/// Share of the vector mass given to category tags
pub const TAG_WEIGHT: f64 = 0.8;
/// Share of the vector mass given to the organizing entity
pub const ORG_WEIGHT: f64 = 0.2;

/// Organizer dimensions for one batch run, in id order.
///
/// Rebuilt for every run since the set of organizers changes as events are
/// published and retired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrgSpace {
    ids: Vec<String>,
}

impl OrgSpace {
    pub fn from_events(events: &[Event]) -> Self {
        let ids: BTreeSet<&str> = events.iter().map(|e| e.organization_id.as_str()).collect();
        OrgSpace {
            ids: ids.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn position(&self, organization_id: &str) -> Option<usize> {
        self.ids
            .binary_search_by(|id| id.as_str().cmp(organization_id))
            .ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Per-run event embedding. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn norm(&self) -> f64 {
        self.0.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&x| x == 0.0)
    }
}

/// Embed one event as `concat(tags * 0.8, org * 0.2)`, L2-normalized.
///
/// An event with no tags whose organizer is outside `orgs` yields the zero
/// vector, left unnormalized.
pub fn vectorize_event(event: &Event, orgs: &OrgSpace) -> FeatureVector {
    let tag_dim = EventTag::ALL.len();
    let mut v = vec![0f64; tag_dim + orgs.len()];

    for tag in &event.tags {
        v[tag.index()] = TAG_WEIGHT;
    }
    if let Some(pos) = orgs.position(&event.organization_id) {
        v[tag_dim + pos] = ORG_WEIGHT;
    }

    // Normalize
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }

    FeatureVector(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EventStatus;

    fn event(id: &str, tags: &[EventTag], org: &str) -> Event {
        Event {
            id: id.to_string(),
            name: id.to_string(),
            tags: tags.to_vec(),
            organization_id: org.to_string(),
            status: EventStatus::Published,
            start_time: 0,
            end_time: 0,
            capacity: 5,
        }
    }

    #[test]
    fn test_dimension_is_vocabulary_plus_organizers() {
        let events = vec![
            event("e1", &[EventTag::Cleanup], "o2"),
            event("e2", &[EventTag::Tutoring], "o1"),
            event("e3", &[EventTag::Tutoring], "o1"),
        ];
        let orgs = OrgSpace::from_events(&events);
        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs.position("o1"), Some(0));
        assert_eq!(orgs.position("o2"), Some(1));
        assert_eq!(orgs.position("o3"), None);

        let v = vectorize_event(&events[0], &orgs);
        assert_eq!(v.dim(), EventTag::ALL.len() + 2);
    }

    #[test]
    fn test_vectors_are_unit_length() {
        let events = vec![
            event("e1", &[EventTag::Cleanup, EventTag::FoodPantry], "o1"),
            event("e2", &[], "o1"),
            event("e3", &[EventTag::Tutoring], "o-outside"),
        ];
        let orgs = OrgSpace::from_events(&events[..2]);

        for e in &events {
            let v = vectorize_event(e, &orgs);
            assert!((v.norm() - 1.0).abs() < 1e-12, "{} has norm {}", e.id, v.norm());
        }
    }

    #[test]
    fn test_tag_block_dominates() {
        let e = event("e1", &[EventTag::AnimalShelter], "o1");
        let orgs = OrgSpace::from_events(std::slice::from_ref(&e));
        let v = vectorize_event(&e, &orgs);
        let s = v.as_slice();

        // 0.8 and 0.2 scaled by the same norm keep their 4:1 ratio
        assert!((s[EventTag::AnimalShelter.index()] / s[EventTag::ALL.len()] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_when_nothing_recognized() {
        let e = event("e1", &[], "o-unknown");
        let v = vectorize_event(&e, &OrgSpace::default());
        assert!(v.is_zero());
        assert_eq!(v.norm(), 0.0);
        assert!(v.as_slice().iter().all(|x| !x.is_nan()));
    }

    #[test]
    fn test_duplicate_tags_count_once() {
        let once = event("e1", &[EventTag::Cleanup], "o1");
        let twice = event("e2", &[EventTag::Cleanup, EventTag::Cleanup], "o1");
        let orgs = OrgSpace::from_events(&[once.clone(), twice.clone()]);
        assert_eq!(vectorize_event(&once, &orgs), vectorize_event(&twice, &orgs));
    }
}
