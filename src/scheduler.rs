use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio::signal::ctrl_c;
use tracing::{error, info, warn};

use crate::{
    batch::SimilarityBuilder,
    data::{EventCatalog, SimilarityStore},
};

/// Next instant strictly after `now` at `hour`:00 UTC
pub fn next_run_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();

    if today > now {
        today
    } else {
        today + Days::new(1)
    }
}

/// Run `rebuild_all` every night at `hour` UTC until Ctrl+C or SIGTERM.
///
/// A failed run is logged and retried on the next cycle.
pub async fn run_nightly<C, S>(builder: Arc<SimilarityBuilder<C, S>>, hour: u32)
where
    C: EventCatalog + Send + Sync + 'static,
    S: SimilarityStore + Send + Sync + 'static,
{
    info!("Nightly similarity job scheduled for {hour:02}:00 UTC");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let now = Utc::now();
        let next = next_run_after(now, hour);
        let wait = (next - now).to_std().unwrap_or_default();
        info!("Next similarity run at {next}");

        tokio::select! {
            _ = &mut shutdown => {
                info!("Scheduler shutting down");
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        let job = builder.clone();
        match tokio::task::spawn_blocking(move || job.rebuild_all()).await {
            Ok(Ok(outcome)) => info!(?outcome, "Nightly similarity run finished"),
            Ok(Err(e)) => error!("Nightly similarity run failed, retrying next cycle: {e}"),
            Err(e) => error!("Nightly similarity task did not complete: {e}"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
