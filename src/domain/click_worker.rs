//! Background worker applying queued click increments to the durable store.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::UrlRepository;

/// Drains the click queue until every sender is dropped.
///
/// At most `concurrency` increments run at once. Increments still in flight
/// when the channel closes are awaited before the worker returns, so shutting
/// down the sender side and awaiting this future flushes all pending clicks.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickEvent>,
    repository: Arc<dyn UrlRepository>,
    concurrency: usize,
) {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };

        let repository = repository.clone();
        in_flight.spawn(async move {
            let _permit = permit;
            record_click(repository.as_ref(), &event).await;
        });

        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}

    info!("Click worker stopped");
}

/// Applies one increment.
///
/// The event is handed to the store exactly once. A failure may come after the
/// increment was committed, so it is logged and counted rather than replayed.
/// Retrying work that never reached the database is up to the repository.
async fn record_click(repository: &dyn UrlRepository, event: &ClickEvent) {
    match repository.increment_clicks(&event.short_code).await {
        Ok(()) => {
            let lag_ms = (Utc::now() - event.occurred_at).num_milliseconds();
            debug!(short_code = %event.short_code, lag_ms, "Click recorded");
            metrics::counter!("clicks_recorded_total").increment(1);
        }
        Err(e) => {
            error!(short_code = %event.short_code, error = %e, "Click increment failed");
            metrics::counter!("clicks_failed_total").increment(1);
        }
    }
}
