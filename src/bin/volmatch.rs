//! Operator CLI for the recommendation engine.
//!
//! ```bash
//! # Nightly-style full rebuild of the similarity index
//! volmatch rebuild-all
//!
//! # Publish/edit trigger for one event
//! volmatch rebuild-event 65f1c0ffee
//!
//! # Long-running scheduler (02:00 UTC unless VOLMATCH_NIGHTLY_HOUR is set)
//! volmatch nightly
//!
//! # Ranked recommendations as JSON
//! volmatch recommend demo-volunteer --scores
//!
//! # Load the demo dataset, then build the index for it
//! volmatch seed-demo && volmatch rebuild-all
//! ```

use std::{process::ExitCode, sync::Arc};

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};
use volmatch::{
    Config, MatchError, Recommender, RocksStore, SimilarityBuilder, scheduler, seed,
};

#[derive(Parser, Debug)]
#[command(name = "volmatch")]
#[command(about = "Volunteer event recommendations and similarity index jobs")]
struct Args {
    /// RocksDB directory (overrides VOLMATCH_DB_PATH)
    #[arg(long)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute similarities for every publishable event
    RebuildAll,
    /// Recompute after one event was published or edited
    RebuildEvent { event_id: String },
    /// Run the full rebuild every night until interrupted
    Nightly,
    /// Print ranked recommendations for a volunteer as JSON
    Recommend {
        volunteer_id: String,
        /// Include scores and the scoring strategy
        #[arg(long)]
        scores: bool,
    },
    /// Write the demo dataset into the database
    SeedDemo {
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let mut config = Config::load();
    if let Some(path) = args.db_path {
        config.db_path = path;
    }

    match run(args.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: Config) -> Result<(), MatchError> {
    info!("Opening database at {}", config.db_path);
    let store = Arc::new(RocksStore::open(&config.db_path)?);
    let builder = SimilarityBuilder::new(store.clone(), store.clone(), config.recommend);

    match command {
        Command::RebuildAll => {
            let outcome = builder.rebuild_all()?;
            print_json(&outcome);
        }
        Command::RebuildEvent { event_id } => {
            let outcome = builder.rebuild_for_event(&event_id)?;
            print_json(&outcome);
        }
        Command::Nightly => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| MatchError::TransientComputationFailure(e.to_string()))?;
            runtime.block_on(scheduler::run_nightly(Arc::new(builder), config.nightly_hour));
        }
        Command::Recommend {
            volunteer_id,
            scores,
        } => {
            let recommender = Recommender::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store,
                config.recommend,
            );
            if scores {
                print_json(&recommender.recommend_with_scores(&volunteer_id)?);
            } else {
                print_json(&recommender.recommend(&volunteer_id)?);
            }
        }
        Command::SeedDemo { seed } => {
            let data = seed::demo_dataset(Utc::now().timestamp(), seed);
            data.store_into(&store)?;
            info!(
                "Stored {} events, {} volunteers and {} registrations",
                data.events.len(),
                data.volunteers.len(),
                data.registrations.len()
            );
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Failed to serialize output: {e}"),
    }
}
