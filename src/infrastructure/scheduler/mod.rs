use crate::domain::reminder::ReminderScheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Runs reminder ticks every `period` until the runtime shuts down.
///
/// Ticks missed while a slow pass was running are skipped rather than fired
/// back to back.
pub fn spawn_reminder_scheduler(
    scheduler: Arc<ReminderScheduler>,
    period: Duration,
    dry_run: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(period_secs = period.as_secs(), dry_run, "Reminder scheduler started");

        loop {
            ticker.tick().await;

            if let Err(e) = scheduler.run_tick(dry_run).await {
                tracing::error!(error = %e, "Reminder tick failed");
            }
            if dry_run {
                continue;
            }
            if let Err(e) = scheduler.purge_processed_events().await {
                tracing::error!(error = %e, "Failed to purge processed payment events");
            }
        }
    })
}
