use crate::domain::profile::Profile;
use crate::error::AppResult;
use crate::infrastructure::repositories::ProfileStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Whether the 30-day trial window has run out (or never opened).
pub fn window_elapsed(profile: &Profile, now: DateTime<Utc>, window: Duration) -> bool {
    profile
        .trial_window_start
        .map_or(true, |start| now - start >= window)
}

/// Trial time left in the current window.
///
/// An elapsed window counts as already rolled over, so the full budget is
/// reported even before the reset has been persisted.
pub fn trial_remaining(
    profile: &Profile,
    now: DateTime<Utc>,
    window: Duration,
    budget: Duration,
) -> Duration {
    if window_elapsed(profile, now, window) {
        return budget;
    }
    match profile.trial_first_use {
        Some(first_use) => {
            let consumed = (now - first_use).max(Duration::zero());
            (budget - consumed).max(Duration::zero())
        }
        None => budget,
    }
}

/// Opens a new window at `now`.
pub fn roll_window(profile: &mut Profile, now: DateTime<Utc>) {
    profile.trial_window_start = Some(now);
    profile.trial_first_use = None;
    profile.trial_used_seconds = 0.0;
    profile.reminder_flags.clear_trial();
}

/// Starts the trial clock; returns `false` when it was already running.
pub fn start_trial(profile: &mut Profile, now: DateTime<Utc>) -> bool {
    if profile.trial_first_use.is_some() || profile.has_paid_access {
        return false;
    }
    profile.trial_first_use = Some(now);
    true
}

/// Persists trial clock changes discovered while serving a user.
pub struct TrialTimer {
    store: Arc<dyn ProfileStore>,
    window: Duration,
}

impl TrialTimer {
    pub fn new(store: Arc<dyn ProfileStore>, window: Duration) -> Self {
        Self { store, window }
    }

    /// Resets an elapsed window in storage and in `profile`.
    ///
    /// The reset is conditional on the window start we read; if another
    /// request got there first the stored row is reloaded instead.
    pub async fn refresh_window(&self, profile: &mut Profile, now: DateTime<Utc>) -> AppResult<bool> {
        if !window_elapsed(profile, now, self.window) {
            return Ok(false);
        }

        let expected = profile.trial_window_start;
        if self
            .store
            .reset_trial_window(profile.user_id, expected, now)
            .await?
        {
            roll_window(profile, now);
            tracing::info!(user_id = %profile.user_id, "Trial window rolled over");
            return Ok(true);
        }

        if let Some(current) = self.store.find_by_id(profile.user_id).await? {
            *profile = current;
        }
        Ok(false)
    }

    /// Stamps first use of the trial. A second touch is a no-op.
    pub async fn touch(&self, profile: &mut Profile, now: DateTime<Utc>) -> AppResult<bool> {
        if profile.trial_first_use.is_some() || profile.has_paid_access {
            return Ok(false);
        }

        let started = self.store.start_trial(profile.user_id, now).await?;
        if started {
            start_trial(profile, now);
            tracing::info!(user_id = %profile.user_id, "Trial clock started");
        } else if let Some(current) = self.store.find_by_id(profile.user_id).await? {
            *profile = current;
        }
        Ok(started)
    }
}
