//! Request-time recommendations.
//!
//! Everything here is read-only against the catalog, ledger, directory and
//! similarity store, so any number of calls may run concurrently.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::{
    config::RecommendConfig,
    data::{
        Event, EventCatalog, EventQuery, RegistrationLedger, SimilarityStore, VolunteerDirectory,
    },
    errors::MatchError,
};

mod eligibility;
mod scorer;

pub use eligibility::{Candidate, Ineligible, eligible_candidates, has_room, precheck};
pub use scorer::{
    CompletedNeighbors, HybridScorer, Recommendation, Strategy, content_score, overlaps, rank,
};

/// Ranked recommendations for one volunteer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationSet {
    pub volunteer_id: String,
    pub strategy: Strategy,
    pub total_recommendations: usize,
    pub recommendations: Vec<Recommendation>,
}

pub struct Recommender<E, L, V, S> {
    catalog: Arc<E>,
    ledger: Arc<L>,
    volunteers: Arc<V>,
    store: Arc<S>,
    config: RecommendConfig,
}

impl<E, L, V, S> Recommender<E, L, V, S>
where
    E: EventCatalog,
    L: RegistrationLedger,
    V: VolunteerDirectory,
    S: SimilarityStore,
{
    pub fn new(
        catalog: Arc<E>,
        ledger: Arc<L>,
        volunteers: Arc<V>,
        store: Arc<S>,
        config: RecommendConfig,
    ) -> Self {
        Self {
            catalog,
            ledger,
            volunteers,
            store,
            config,
        }
    }

    /// Ranked events for a volunteer, scores dropped
    pub fn recommend(&self, volunteer_id: &str) -> Result<Vec<Event>, MatchError> {
        Ok(self
            .recommend_with_scores(volunteer_id)?
            .recommendations
            .into_iter()
            .map(|r| r.event)
            .collect())
    }

    pub fn recommend_with_scores(&self, volunteer_id: &str) -> Result<RecommendationSet, MatchError> {
        self.recommend_at(volunteer_id, Utc::now().timestamp())
    }

    /// Rank upcoming events for `volunteer_id` as of `now` (unix seconds)
    pub fn recommend_at(&self, volunteer_id: &str, now: i64) -> Result<RecommendationSet, MatchError> {
        let volunteer = self
            .volunteers
            .get_volunteer(volunteer_id)?
            .ok_or_else(|| MatchError::VolunteerNotFound(volunteer_id.to_string()))?;

        let completed = self.ledger.completed_event_ids(volunteer_id)?;

        let query = EventQuery::publishable(self.config.candidate_limit).starting_after(now);
        let pool = self.catalog.find_events(&query)?;
        let candidates = eligible_candidates(self.ledger.as_ref(), volunteer_id, pool, now)?;

        let scorer = HybridScorer::new(self.store.as_ref(), self.config);
        let (strategy, recommendations) = scorer.score(&volunteer, &completed, candidates)?;

        info!(
            "Ranked {} events for volunteer {volunteer_id} using {strategy:?}",
            recommendations.len()
        );

        Ok(RecommendationSet {
            volunteer_id: volunteer_id.to_string(),
            strategy,
            total_recommendations: recommendations.len(),
            recommendations,
        })
    }
}
