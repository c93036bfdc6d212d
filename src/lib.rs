//! Volunteer-to-event recommendations.
//!
//! A batch job ([`SimilarityBuilder`]) embeds every publishable event and
//! stores, per event, the neighbors whose cosine similarity reaches the
//! threshold. At request time the [`Recommender`] filters upcoming events down
//! to those a volunteer may still join and ranks them with stored similarity
//! to the volunteer's completed events plus tag overlap with their
//! preferences, falling back to tag overlap or popularity on cold start.

pub mod batch;
pub mod config;
pub mod data;
pub mod embed;
pub mod errors;
pub mod recommend;
pub mod scheduler;
pub mod seed;

// Exports for external use
pub use batch::{BuildOutcome, BuildReport, SimilarityBuilder};
pub use config::{Config, RecommendConfig};
pub use data::{
    Event, EventCatalog, EventSimilarity, EventStatus, EventTag, MemoryStore, Neighbor,
    Registration, RegistrationLedger, RegistrationStatus, RocksStore, SimilarityStore, Volunteer,
    VolunteerDirectory,
};
pub use errors::MatchError;
pub use recommend::{Recommendation, RecommendationSet, Recommender, Strategy};
