use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::RecommendConfig,
    data::{Event, EventTag, SimilarityStore, Volunteer},
    errors::MatchError,
    recommend::eligibility::Candidate,
};

/// Which scoring branch produced a ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Stored similarity to completed events blended with tag overlap
    Hybrid,
    /// Cold start with stated preferences: tag overlap only
    ContentOnly,
    /// Cold start without preferences: registration fill ratio
    Popularity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub event: Event,
    pub score: f64,
}

/// Share of `preferences` covered by the event's tags, 0 without preferences
pub fn content_score(event: &Event, preferences: &[EventTag]) -> f64 {
    if preferences.is_empty() {
        return 0.0;
    }

    let matching = preferences.iter().filter(|tag| event.has_tag(**tag)).count();
    matching as f64 / preferences.len() as f64
}

/// Whether the event shares at least one tag with the preferences
pub fn overlaps(event: &Event, preferences: &[EventTag]) -> bool {
    preferences.iter().any(|tag| event.has_tag(*tag))
}

/// Neighbor rows of a volunteer's completed events, loaded once per call
pub struct CompletedNeighbors {
    rows: Vec<HashMap<String, f64>>, // one per completed event, in id order
}

impl CompletedNeighbors {
    pub fn load<S: SimilarityStore>(
        store: &S,
        completed: &BTreeSet<String>,
    ) -> Result<Self, MatchError> {
        let mut rows = Vec::with_capacity(completed.len());
        for event_id in completed {
            let neighbors = store.neighbors(event_id)?;
            rows.push(
                neighbors
                    .into_iter()
                    .map(|n| (n.event_id, n.score))
                    .collect(),
            );
        }
        Ok(Self { rows })
    }

    /// Mean stored similarity between `candidate_id` and each completed
    /// event. A missing edge counts as 0.
    pub fn collaborative_score(&self, candidate_id: &str) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }

        let total: f64 = self
            .rows
            .iter()
            .map(|row| row.get(candidate_id).copied().unwrap_or(0.0))
            .sum();
        total / self.rows.len() as f64
    }
}

/// Canonical ranking: score descending, then event id ascending
pub fn rank(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.event.id.cmp(&b.event.id))
    });
}

/// Collaborative + content scorer with cold-start fallbacks.
///
/// Reads the similarity store only; never recomputes similarity.
pub struct HybridScorer<'a, S> {
    store: &'a S,
    config: RecommendConfig,
}

impl<'a, S: SimilarityStore> HybridScorer<'a, S> {
    pub fn new(store: &'a S, config: RecommendConfig) -> Self {
        Self { store, config }
    }

    pub fn strategy_for(volunteer: &Volunteer, completed: &BTreeSet<String>) -> Strategy {
        if !completed.is_empty() {
            Strategy::Hybrid
        } else if !volunteer.preferences.is_empty() {
            Strategy::ContentOnly
        } else {
            Strategy::Popularity
        }
    }

    /// Score and rank `candidates`, which must already be eligible
    pub fn score(
        &self,
        volunteer: &Volunteer,
        completed: &BTreeSet<String>,
        mut candidates: Vec<Candidate>,
    ) -> Result<(Strategy, Vec<Recommendation>), MatchError> {
        if candidates.len() > self.config.candidate_limit {
            warn!(
                "Candidate pool of {} exceeds limit {}, truncating",
                candidates.len(),
                self.config.candidate_limit
            );
            candidates.truncate(self.config.candidate_limit);
        }

        let preferences = volunteer.preferences.as_slice();
        let strategy = Self::strategy_for(volunteer, completed);
        debug!(
            volunteer_id = %volunteer.id,
            ?strategy,
            candidates = candidates.len(),
            completed = completed.len(),
            "Scoring candidates"
        );

        let mut recommendations: Vec<Recommendation> = match strategy {
            Strategy::Hybrid => {
                let history = CompletedNeighbors::load(self.store, completed)?;
                candidates
                    .into_iter()
                    .map(|c| {
                        let collaborative = history.collaborative_score(&c.event.id);
                        let content = content_score(&c.event, preferences);
                        let score = self.config.collab_weight * collaborative
                            + self.config.content_weight * content;
                        Recommendation {
                            event: c.event,
                            score,
                        }
                    })
                    .collect()
            }
            Strategy::ContentOnly => candidates
                .into_iter()
                .filter(|c| overlaps(&c.event, preferences))
                .map(|c| Recommendation {
                    score: content_score(&c.event, preferences),
                    event: c.event,
                })
                .collect(),
            Strategy::Popularity => candidates
                .into_iter()
                .map(|c| Recommendation {
                    score: c.fill_ratio(),
                    event: c.event,
                })
                .collect(),
        };

        rank(&mut recommendations);
        Ok((strategy, recommendations))
    }
}
