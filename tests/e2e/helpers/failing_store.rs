use async_trait::async_trait;
use capacity_access::{
    domain::profile::{Profile, ReminderKind},
    error::{AppError, AppResult},
    infrastructure::repositories::{PaymentApplication, ProfileMutation, ProfileStore},
};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Store that is unreachable: every call fails, optionally after a delay.
pub struct FailingProfileStore {
    delay: Option<Duration>,
}

impl FailingProfileStore {
    pub fn new() -> Self {
        Self { delay: None }
    }

    /// Calls hang for `delay` before failing.
    pub fn slow(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }

    async fn fail<T>(&self) -> AppResult<T> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(AppError::Internal("profile store offline".to_string()))
    }
}

#[async_trait]
impl ProfileStore for FailingProfileStore {
    async fn ping(&self) -> AppResult<()> {
        self.fail().await
    }

    async fn find_by_id(&self, _user_id: Uuid) -> AppResult<Option<Profile>> {
        self.fail().await
    }

    async fn find_by_email(&self, _email: &str) -> AppResult<Option<Profile>> {
        self.fail().await
    }

    async fn find_or_create(&self, _user_id: Uuid, _email: &str, _now: DateTime<Utc>) -> AppResult<Profile> {
        self.fail().await
    }

    async fn start_trial(&self, _user_id: Uuid, _now: DateTime<Utc>) -> AppResult<bool> {
        self.fail().await
    }

    async fn reset_trial_window(
        &self,
        _user_id: Uuid,
        _expected_start: Option<DateTime<Utc>>,
        _now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.fail().await
    }

    async fn apply_payment(
        &self,
        _event_key: &str,
        _user_id: Uuid,
        _now: DateTime<Utc>,
        _mutation: ProfileMutation,
    ) -> AppResult<PaymentApplication> {
        self.fail().await
    }

    async fn claim_reminder(&self, _user_id: Uuid, _kind: ReminderKind) -> AppResult<bool> {
        self.fail().await
    }

    async fn trial_reminder_candidates(&self, _first_use_after: DateTime<Utc>) -> AppResult<Vec<Profile>> {
        self.fail().await
    }

    async fn paid_reminder_candidates(
        &self,
        _now: DateTime<Utc>,
        _horizon: DateTime<Utc>,
    ) -> AppResult<Vec<Profile>> {
        self.fail().await
    }

    async fn purge_processed_events(&self, _before: DateTime<Utc>) -> AppResult<u64> {
        self.fail().await
    }
}
