use std::cmp::Ordering;

use bincode::{Decode, Encode};
use serde::Serialize;

/// One stored similarity edge
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize)]
pub struct Neighbor {
    pub event_id: String,
    pub score: f64,
}

/// Persisted neighbor list for a single event.
///
/// Rows are only ever produced by the batch builder. `neighbors` is sorted by
/// score descending with ties broken by neighbor id ascending, never contains
/// `event_id` itself and only holds scores at or above the threshold used for
/// the run.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize)]
pub struct EventSimilarity {
    pub event_id: String,
    pub neighbors: Vec<Neighbor>,
    pub last_updated: i64, // Unix timestamp
}

impl EventSimilarity {
    /// Stored score for `other`, if this row lists it
    pub fn score_for(&self, other: &str) -> Option<f64> {
        self.neighbors
            .iter()
            .find(|n| n.event_id == other)
            .map(|n| n.score)
    }

    /// Same neighbors with the same scores, ignoring the timestamp
    pub fn same_neighbors(&self, neighbors: &[Neighbor]) -> bool {
        self.neighbors.as_slice() == neighbors
    }
}

/// Canonical neighbor ordering: score descending, then id ascending
pub fn neighbor_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.event_id.cmp(&b.event_id))
}
