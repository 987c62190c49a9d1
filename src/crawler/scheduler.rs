//! Outer polling loop
//!
//! Repeats crawl cycles forever: run a cycle, dispatch its alerts, sleep a
//! fixed interval plus bounded random jitter, repeat. Shutdown is
//! cooperative via a cancellation token, observed both between cycles and
//! during the inter-cycle sleep. Cycle failures are logged and never stop
//! the loop.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::ScheduleConfig;
use crate::crawler::coordinator::Coordinator;
use crate::crawler::render::RenderPage;
use crate::notify::{dispatch_alerts, Notifier};
use crate::storage::CatalogStore;

/// Runs the watch loop until `cancel` fires.
pub async fn run_watch_loop<P, S>(
    coordinator: &mut Coordinator<S>,
    page: &mut P,
    notifier: &dyn Notifier,
    channel_id: &str,
    schedule: &ScheduleConfig,
    cancel: CancellationToken,
) where
    P: RenderPage,
    S: CatalogStore,
{
    loop {
        if cancel.is_cancelled() {
            tracing::info!("Shutdown requested; stopping watch loop");
            break;
        }

        match coordinator.run_cycle(page).await {
            Ok(alerts) => {
                tracing::info!("Alerts to send: {}", alerts.len());
                let sent = dispatch_alerts(notifier, channel_id, &alerts).await;
                if sent < alerts.len() {
                    tracing::warn!("{} of {} alerts failed to send", alerts.len() - sent, alerts.len());
                }
            }
            Err(e) => tracing::error!("Crawl cycle failed: {}", e),
        }

        let delay = next_delay(schedule);
        tracing::info!("Waiting {:?} before next crawl", delay);

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Shutdown requested during sleep; stopping watch loop");
                break;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Base interval plus random jitter in `[0, max_jitter)`.
pub fn next_delay(schedule: &ScheduleConfig) -> Duration {
    let jitter_ms = if schedule.max_jitter_secs == 0 {
        0
    } else {
        fastrand::u64(0..schedule.max_jitter_secs * 1000)
    };

    schedule.check_interval() + Duration::from_millis(jitter_ms)
}
