use super::selection::{due_paid_reminders, due_trial_reminder, DueReminder};
use super::ReminderError;
use crate::domain::access::trial::window_elapsed;
use crate::domain::access::TrialTimer;
use crate::domain::notification::EmailComposer;
use crate::domain::profile::Profile;
use crate::domain::subscription::SubscriptionPolicy;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::repositories::{EmailQueue, ProfileStore};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ReminderSettings {
    /// Half-width of each paid reminder's firing window. Must be at least
    /// the tick period or reminders can fall between ticks.
    pub tolerance: Duration,
    /// How long processed webhook keys are kept.
    pub retention: Duration,
}

/// Counters for one scheduler pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub candidates: usize,
    pub sent: usize,
    /// Reminders another tick claimed first.
    pub skipped: usize,
    pub failed: usize,
    pub rolled_over: usize,
    /// Reminders that would have been sent, in dry-run mode.
    pub planned: Vec<PlannedReminder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedReminder {
    pub user_id: Uuid,
    pub email: String,
    pub kind: String,
}

pub struct ReminderScheduler {
    store: Arc<dyn ProfileStore>,
    emails: Arc<dyn EmailQueue>,
    policy: Arc<SubscriptionPolicy>,
    composer: Arc<EmailComposer>,
    clock: Arc<dyn Clock>,
    trial_timer: TrialTimer,
    settings: ReminderSettings,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        emails: Arc<dyn EmailQueue>,
        policy: Arc<SubscriptionPolicy>,
        composer: Arc<EmailComposer>,
        clock: Arc<dyn Clock>,
        settings: ReminderSettings,
    ) -> Self {
        let trial_timer = TrialTimer::new(store.clone(), policy.trial_window());
        Self {
            store,
            emails,
            policy,
            composer,
            clock,
            trial_timer,
            settings,
        }
    }

    /// Runs one pass over trial and paid reminder candidates.
    ///
    /// Each reminder flag is claimed before its email is enqueued, so a
    /// (user, kind) pair is sent at most once per cycle even when ticks
    /// overlap. With `dry_run` nothing is claimed, enqueued or reset.
    pub async fn run_tick(&self, dry_run: bool) -> Result<TickReport, ReminderError> {
        let now = self.clock.now();
        let mut report = TickReport::default();

        let trial_candidates = self
            .store
            .trial_reminder_candidates(now - self.policy.trial_window())
            .await?;
        let horizon = now + self.policy.max_reminder_offset() + self.settings.tolerance;
        let paid_candidates = self.store.paid_reminder_candidates(now, horizon).await?;
        report.candidates = trial_candidates.len() + paid_candidates.len();

        for mut profile in trial_candidates {
            if window_elapsed(&profile, now, self.policy.trial_window()) {
                if !dry_run && self.trial_timer.refresh_window(&mut profile, now).await? {
                    report.rolled_over += 1;
                }
                continue;
            }
            if let Some(due) = due_trial_reminder(&profile, now, &self.policy) {
                self.deliver(&profile, due, dry_run, &mut report).await?;
            }
        }

        for profile in paid_candidates {
            for due in due_paid_reminders(&profile, now, &self.policy, self.settings.tolerance) {
                self.deliver(&profile, due, dry_run, &mut report).await?;
            }
        }

        tracing::info!(
            dry_run,
            candidates = report.candidates,
            sent = report.sent,
            skipped = report.skipped,
            failed = report.failed,
            rolled_over = report.rolled_over,
            "Reminder tick finished"
        );

        Ok(report)
    }

    async fn deliver(
        &self,
        profile: &Profile,
        due: DueReminder,
        dry_run: bool,
        report: &mut TickReport,
    ) -> Result<(), ReminderError> {
        if dry_run {
            report.planned.push(PlannedReminder {
                user_id: profile.user_id,
                email: profile.email.clone(),
                kind: due.kind.to_string(),
            });
            return Ok(());
        }

        if !self.store.claim_reminder(profile.user_id, due.kind).await? {
            tracing::debug!(user_id = %profile.user_id, kind = %due.kind, "Reminder already claimed");
            report.skipped += 1;
            return Ok(());
        }

        let email = self.composer.reminder(profile, due.kind, due.remaining);
        match self.emails.enqueue(&email).await {
            Ok(()) => {
                tracing::info!(user_id = %profile.user_id, kind = %due.kind, "Reminder queued");
                report.sent += 1;
            }
            Err(e) => {
                tracing::error!(
                    user_id = %profile.user_id,
                    kind = %due.kind,
                    error = %e,
                    "Failed to enqueue reminder"
                );
                report.failed += 1;
            }
        }

        Ok(())
    }

    /// Drops processed webhook keys older than the retention horizon.
    pub async fn purge_processed_events(&self) -> Result<u64, ReminderError> {
        let before: DateTime<Utc> = self.clock.now() - self.settings.retention;
        let purged = self.store.purge_processed_events(before).await?;
        if purged > 0 {
            tracing::info!(purged, "Purged processed payment events");
        }
        Ok(purged)
    }
}
