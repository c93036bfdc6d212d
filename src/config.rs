use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Maximum number of events considered per scoring call and per batch run.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 200;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_COLLAB_WEIGHT: f64 = 0.7;
pub const DEFAULT_CONTENT_WEIGHT: f64 = 0.3;
pub const DEFAULT_NIGHTLY_HOUR: u32 = 2;

/// Tunables shared by the similarity builder and the hybrid scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendConfig {
    pub candidate_limit: usize,
    pub similarity_threshold: f64,
    pub collab_weight: f64,
    pub content_weight: f64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            collab_weight: DEFAULT_COLLAB_WEIGHT,
            content_weight: DEFAULT_CONTENT_WEIGHT,
        }
    }
}

pub struct Config {
    pub db_path: String,
    pub nightly_hour: u32,
    pub recommend: RecommendConfig,
}

impl Config {
    pub fn load() -> Self {
        let nightly_hour: u32 = try_load("VOLMATCH_NIGHTLY_HOUR", DEFAULT_NIGHTLY_HOUR);
        let nightly_hour = if nightly_hour < 24 {
            nightly_hour
        } else {
            warn!("VOLMATCH_NIGHTLY_HOUR={nightly_hour} out of range, using {DEFAULT_NIGHTLY_HOUR}");
            DEFAULT_NIGHTLY_HOUR
        };

        Self {
            db_path: try_load("VOLMATCH_DB_PATH", "volmatch_db".to_string()),
            nightly_hour,
            recommend: RecommendConfig {
                candidate_limit: try_load("VOLMATCH_CANDIDATE_LIMIT", DEFAULT_CANDIDATE_LIMIT),
                similarity_threshold: try_load(
                    "VOLMATCH_SIMILARITY_THRESHOLD",
                    DEFAULT_SIMILARITY_THRESHOLD,
                ),
                collab_weight: try_load("VOLMATCH_COLLAB_WEIGHT", DEFAULT_COLLAB_WEIGHT),
                content_weight: try_load("VOLMATCH_CONTENT_WEIGHT", DEFAULT_CONTENT_WEIGHT),
            },
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
    }
}
