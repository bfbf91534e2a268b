use crate::domain::profile::{Profile, ReminderKind};
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Change applied to a locked profile while a payment event is recorded.
pub type ProfileMutation = Box<dyn FnOnce(&mut Profile) + Send>;

/// Result of recording a payment event against a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentApplication {
    /// The event key was new; the profile after the mutation.
    Applied(Profile),
    /// The event key was already recorded; nothing changed.
    Duplicate,
    /// No profile exists for the user; the event key was not recorded.
    MissingProfile,
}

/// Persistence for subscription profiles and processed payment events.
///
/// Implementations must make `apply_payment` atomic: the event key and the
/// profile change are committed together or not at all, and concurrent calls
/// for the same user are serialized.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> AppResult<()>;

    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<Profile>>;

    /// Case-insensitive lookup. Emails are not unique; when several profiles
    /// match, the paid one with the furthest-reaching access wins.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Profile>>;

    /// Returns the stored profile, creating one with a window opening at `now`
    /// if the user has none.
    async fn find_or_create(&self, user_id: Uuid, email: &str, now: DateTime<Utc>) -> AppResult<Profile>;

    /// Stamps `trial_first_use` only if it is still unset and the user never
    /// paid. Returns whether this call stamped it.
    async fn start_trial(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;

    /// Opens a new trial window if the stored window start still equals
    /// `expected_start`. Clears trial state and trial reminder flags.
    async fn reset_trial_window(
        &self,
        user_id: Uuid,
        expected_start: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Records `event_key` and applies `mutation` to the user's profile in one
    /// atomic step.
    async fn apply_payment(
        &self,
        event_key: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
        mutation: ProfileMutation,
    ) -> AppResult<PaymentApplication>;

    /// Adds `kind` to the reminder flags unless already present. Returns
    /// whether this call added it.
    async fn claim_reminder(&self, user_id: Uuid, kind: ReminderKind) -> AppResult<bool>;

    /// Unpaid profiles whose trial started after `first_use_after`.
    async fn trial_reminder_candidates(&self, first_use_after: DateTime<Utc>) -> AppResult<Vec<Profile>>;

    /// Paid profiles with an expiry in `(now, horizon]`.
    async fn paid_reminder_candidates(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> AppResult<Vec<Profile>>;

    /// Forgets processed event keys recorded before `before`.
    async fn purge_processed_events(&self, before: DateTime<Utc>) -> AppResult<u64>;
}
