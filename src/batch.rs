//! Similarity Builder
//!
//! Background jobs that (re)compute the event similarity index. Nothing here
//! runs on the request path; scoring only ever reads the rows written below.
//!
//! Both jobs compute every row in memory before the first write. A store
//! failure aborts the run; rows already written stay individually valid and
//! the previous state of unwritten rows remains authoritative until the next
//! run.
//!
//! Rows of events that leave the publishable window are not dropped when the
//! event completed (or is still published): they are the history that
//! collaborative scoring reads. Such rows are frozen, and their edges into the
//! window are mirrored onto the window rows so every stored edge has its
//! reverse. Rows of cancelled, deleted, draft or unknown events are removed.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    config::RecommendConfig,
    data::{Event, EventCatalog, EventSimilarity, Neighbor, SimilarityStore, neighbor_order},
    embed::SimilarityMatrix,
    errors::MatchError,
};

/// Statistics for a run that reached the write phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub total_events: usize,
    pub rows_written: usize,
    pub rows_pruned: usize,
    /// Directed edges across all written rows
    pub edges: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The triggering event is not open for registration
    NotPublished,
    /// The triggering event fell outside the capped event window
    OutsideBatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BuildOutcome {
    Completed(BuildReport),
    /// Fewer than two publishable events; the store was left untouched
    InsufficientData { total_events: usize },
    Skipped { event_id: String, reason: SkipReason },
}

/// Everything a run will write, decided before the first write
struct Plan {
    /// One row per event in the window
    rows: Vec<EventSimilarity>,
    /// History rows whose stored list lost edges
    history: Vec<EventSimilarity>,
    /// Rows to delete
    withdrawn: Vec<String>,
}

pub struct SimilarityBuilder<C, S> {
    catalog: Arc<C>,
    store: Arc<S>,
    config: RecommendConfig,
}

impl<C, S> SimilarityBuilder<C, S>
where
    C: EventCatalog,
    S: SimilarityStore,
{
    pub fn new(catalog: Arc<C>, store: Arc<S>, config: RecommendConfig) -> Self {
        Self {
            catalog,
            store,
            config,
        }
    }

    /// Nightly job: rewrite the row of every event in the window, trim
    /// history rows and drop rows of withdrawn events.
    pub fn rebuild_all(&self) -> Result<BuildOutcome, MatchError> {
        self.rebuild_all_at(Utc::now().timestamp())
    }

    pub fn rebuild_all_at(&self, now: i64) -> Result<BuildOutcome, MatchError> {
        info!("Starting batch event similarity computation");
        let start = Instant::now();

        let result = self.run_full(now, start);
        if let Err(e) = &result {
            error!("Error during batch similarity computation: {e}");
        }
        result.map_err(abort)
    }

    /// Publish/edit trigger: recompute the full event set and rewrite every
    /// row whose neighbor list changed, so edges touching `event_id` stay
    /// symmetric.
    pub fn rebuild_for_event(&self, event_id: &str) -> Result<BuildOutcome, MatchError> {
        self.rebuild_for_event_at(event_id, Utc::now().timestamp())
    }

    pub fn rebuild_for_event_at(&self, event_id: &str, now: i64) -> Result<BuildOutcome, MatchError> {
        info!("Computing similarities for event {event_id}");
        let start = Instant::now();

        let result = self.run_for_event(event_id, now, start);
        if let Err(e) = &result {
            error!("Error computing similarities for event {event_id}: {e}");
        }
        result.map_err(abort)
    }

    fn run_full(&self, now: i64, start: Instant) -> Result<BuildOutcome, MatchError> {
        let events = self.load_window(now)?;
        if events.len() < 2 {
            info!("Not enough published events to compute similarities");
            return Ok(BuildOutcome::InsufficientData {
                total_events: events.len(),
            });
        }

        info!("Computing similarities for {} published events", events.len());
        let Plan {
            mut rows,
            history,
            withdrawn,
        } = self.plan(&events, now)?;
        rows.extend(history);

        self.write(&rows, &withdrawn)?;

        let report = BuildReport {
            total_events: events.len(),
            rows_written: rows.len(),
            rows_pruned: withdrawn.len(),
            edges: rows.iter().map(|r| r.neighbors.len()).sum(),
            duration: start.elapsed(),
        };
        info!(
            "Batch computation complete. Processed {} events, stored {} similarity records ({} pruned) in {:.2} seconds",
            report.total_events,
            report.rows_written,
            report.rows_pruned,
            report.duration.as_secs_f64()
        );

        Ok(BuildOutcome::Completed(report))
    }

    fn run_for_event(
        &self,
        event_id: &str,
        now: i64,
        start: Instant,
    ) -> Result<BuildOutcome, MatchError> {
        let target = self
            .catalog
            .get_event(event_id)?
            .ok_or_else(|| MatchError::EventNotFound(event_id.to_string()))?;

        if !target.status.is_open() {
            warn!("Event {event_id} is not published, skipping similarity computation");
            return Ok(BuildOutcome::Skipped {
                event_id: event_id.to_string(),
                reason: SkipReason::NotPublished,
            });
        }

        let events = self.load_window(now)?;
        if events.len() < 2 {
            info!("Not enough events to compute similarities");
            return Ok(BuildOutcome::InsufficientData {
                total_events: events.len(),
            });
        }
        if !events.iter().any(|e| e.id == event_id) {
            warn!("Event {event_id} is outside the current event window, skipping");
            return Ok(BuildOutcome::Skipped {
                event_id: event_id.to_string(),
                reason: SkipReason::OutsideBatch,
            });
        }

        let Plan {
            rows,
            history,
            withdrawn,
        } = self.plan(&events, now)?;

        // Decide what to write before writing anything
        let mut changed = Vec::new();
        for row in rows {
            let stored = self.store.neighbors(&row.event_id)?;
            if row.event_id == event_id || stored != row.neighbors {
                changed.push(row);
            }
        }
        changed.extend(history);

        self.write(&changed, &withdrawn)?;

        let report = BuildReport {
            total_events: events.len(),
            rows_written: changed.len(),
            rows_pruned: withdrawn.len(),
            edges: changed.iter().map(|r| r.neighbors.len()).sum(),
            duration: start.elapsed(),
        };
        info!(
            "Rewrote {} similarity rows ({} pruned) for event {event_id} in {:.2} seconds",
            report.rows_written,
            report.rows_pruned,
            report.duration.as_secs_f64()
        );

        Ok(BuildOutcome::Completed(report))
    }

    fn load_window(&self, now: i64) -> Result<Vec<Event>, MatchError> {
        let events = self
            .catalog
            .publishable_events(self.config.candidate_limit, now)?;
        Ok(events.into_iter().filter(|e| !e.id.is_empty()).collect())
    }

    /// Fresh rows for the window plus the fate of every stored row outside it
    fn plan(&self, events: &[Event], now: i64) -> Result<Plan, MatchError> {
        let threshold = self.config.similarity_threshold;
        let mut rows = self.compute_rows(events, now);
        let window: HashSet<&str> = events.iter().map(|e| e.id.as_str()).collect();

        let mut kept = Vec::new();
        let mut withdrawn = Vec::new();
        for event_id in self.store.indexed_event_ids()? {
            if window.contains(event_id.as_str()) {
                continue;
            }

            let keeps_history = self
                .catalog
                .get_event(&event_id)?
                .is_some_and(|e| e.status.keeps_history());
            match self.store.get(&event_id)? {
                Some(row) if keeps_history => kept.push(row),
                _ => withdrawn.push(event_id),
            }
        }

        // An edge between two history rows survives only while both list it
        let kept_edges: HashSet<(String, String)> = kept
            .iter()
            .flat_map(|row| {
                row.neighbors
                    .iter()
                    .map(move |n| (row.event_id.clone(), n.event_id.clone()))
            })
            .collect();

        let mut mirrored: HashMap<String, Vec<Neighbor>> = HashMap::new();
        let mut history = Vec::new();
        for mut row in kept {
            let stored = row.neighbors.clone();
            row.neighbors.retain(|n| {
                n.score >= threshold
                    && (window.contains(n.event_id.as_str())
                        || kept_edges.contains(&(n.event_id.clone(), row.event_id.clone())))
            });

            for n in row
                .neighbors
                .iter()
                .filter(|n| window.contains(n.event_id.as_str()))
            {
                mirrored
                    .entry(n.event_id.clone())
                    .or_default()
                    .push(Neighbor {
                        event_id: row.event_id.clone(),
                        score: n.score,
                    });
            }

            if row.neighbors != stored {
                debug!(event_id = %row.event_id, "Trimming history row");
                row.last_updated = now;
                history.push(row);
            }
        }

        for row in &mut rows {
            if let Some(extra) = mirrored.remove(&row.event_id) {
                row.neighbors.extend(extra);
                row.neighbors.sort_by(neighbor_order);
            }
        }

        Ok(Plan {
            rows,
            history,
            withdrawn,
        })
    }

    fn compute_rows(&self, events: &[Event], now: i64) -> Vec<EventSimilarity> {
        let matrix = SimilarityMatrix::compute(events);

        matrix
            .neighbor_lists(self.config.similarity_threshold)
            .into_iter()
            .map(|(event_id, neighbors): (String, Vec<Neighbor>)| EventSimilarity {
                event_id,
                neighbors,
                last_updated: now,
            })
            .collect()
    }

    fn write(&self, rows: &[EventSimilarity], withdrawn: &[String]) -> Result<(), MatchError> {
        for row in rows {
            self.store.upsert(row)?;
        }
        for event_id in withdrawn {
            self.store.remove(event_id)?;
        }
        Ok(())
    }
}

/// Not-found stays as is; anything else becomes a retryable abort
fn abort(err: MatchError) -> MatchError {
    match err {
        e @ (MatchError::VolunteerNotFound(_)
        | MatchError::EventNotFound(_)
        | MatchError::TransientComputationFailure(_)) => e,
        other => MatchError::TransientComputationFailure(other.to_string()),
    }
}
