use crate::domain::access::trial::roll_window;
use crate::domain::notification::OutboundEmail;
use crate::domain::profile::{Profile, ReminderKind};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{
    EmailQueue, PaymentApplication, ProfileMutation, ProfileStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Process-local profile store for tests and single-node development.
///
/// Every operation takes the same lock, which gives `apply_payment` the
/// serialization a database row lock would.
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    processed: Cache<String, DateTime<Utc>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::with_retention(Duration::days(30))
    }

    /// Processed event keys are also evicted once `retention` has passed in
    /// wall-clock time.
    pub fn with_retention(retention: Duration) -> Self {
        let ttl = retention
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(30 * 24 * 3600));
        Self {
            profiles: Mutex::new(HashMap::new()),
            processed: Cache::builder().time_to_live(ttl).build(),
        }
    }

    /// Replaces or inserts a profile as-is.
    pub async fn put(&self, profile: Profile) {
        self.profiles.lock().await.insert(profile.user_id, profile);
    }

    pub fn is_processed(&self, event_key: &str) -> bool {
        self.processed.contains_key(event_key)
    }
}

/// Preference among profiles sharing an email: paid before unpaid, perpetual
/// before dated, later expiry first. Ties fall to the lowest user id.
fn email_match_rank(profile: &Profile) -> (bool, bool, Option<DateTime<Utc>>) {
    let perpetual = profile.has_paid_access && profile.paid_access_expiry.is_none();
    (profile.has_paid_access, perpetual, profile.paid_access_expiry)
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.profiles.lock().await.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Profile>> {
        let email = email.trim().to_lowercase();
        let profiles = self.profiles.lock().await;
        Ok(profiles
            .values()
            .filter(|profile| profile.email.to_lowercase() == email)
            .max_by(|a, b| {
                email_match_rank(a)
                    .cmp(&email_match_rank(b))
                    .then_with(|| b.user_id.cmp(&a.user_id))
            })
            .cloned())
    }

    async fn find_or_create(&self, user_id: Uuid, email: &str, now: DateTime<Utc>) -> AppResult<Profile> {
        let mut profiles = self.profiles.lock().await;
        if let Some(profile) = profiles.get(&user_id) {
            return Ok(profile.clone());
        }

        let profile = Profile::new(user_id, email.trim(), now);
        profiles.insert(user_id, profile.clone());
        Ok(profile)
    }

    async fn start_trial(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let mut profiles = self.profiles.lock().await;
        match profiles.get_mut(&user_id) {
            Some(profile) if profile.trial_first_use.is_none() && !profile.has_paid_access => {
                profile.trial_first_use = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reset_trial_window(
        &self,
        user_id: Uuid,
        expected_start: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut profiles = self.profiles.lock().await;
        match profiles.get_mut(&user_id) {
            Some(profile) if profile.trial_window_start == expected_start => {
                roll_window(profile, now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn apply_payment(
        &self,
        event_key: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
        mutation: ProfileMutation,
    ) -> AppResult<PaymentApplication> {
        let mut profiles = self.profiles.lock().await;

        if self.processed.contains_key(event_key) {
            return Ok(PaymentApplication::Duplicate);
        }
        let Some(profile) = profiles.get_mut(&user_id) else {
            return Ok(PaymentApplication::MissingProfile);
        };

        mutation(profile);
        self.processed.insert(event_key.to_string(), now).await;

        Ok(PaymentApplication::Applied(profile.clone()))
    }

    async fn claim_reminder(&self, user_id: Uuid, kind: ReminderKind) -> AppResult<bool> {
        let mut profiles = self.profiles.lock().await;
        Ok(profiles
            .get_mut(&user_id)
            .map_or(false, |profile| profile.reminder_flags.insert(kind)))
    }

    async fn trial_reminder_candidates(&self, first_use_after: DateTime<Utc>) -> AppResult<Vec<Profile>> {
        let profiles = self.profiles.lock().await;
        Ok(profiles
            .values()
            .filter(|profile| !profile.has_paid_access)
            .filter(|profile| profile.trial_first_use.map_or(false, |at| at > first_use_after))
            .cloned()
            .collect())
    }

    async fn paid_reminder_candidates(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> AppResult<Vec<Profile>> {
        let profiles = self.profiles.lock().await;
        Ok(profiles
            .values()
            .filter(|profile| profile.has_paid_access)
            .filter(|profile| {
                profile
                    .paid_access_expiry
                    .map_or(false, |expiry| expiry > now && expiry <= horizon)
            })
            .cloned()
            .collect())
    }

    async fn purge_processed_events(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let stale: Vec<String> = self
            .processed
            .iter()
            .filter(|(_, processed_at)| *processed_at < before)
            .map(|(key, _)| key.to_string())
            .collect();

        for key in &stale {
            self.processed.invalidate(key).await;
        }

        Ok(stale.len() as u64)
    }
}

/// Collects enqueued mail in memory. Can be switched into a failing mode to
/// exercise delivery errors.
#[derive(Default)]
pub struct InMemoryEmailQueue {
    emails: parking_lot::Mutex<Vec<OutboundEmail>>,
    failing: AtomicBool,
}

impl InMemoryEmailQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emails(&self) -> Vec<OutboundEmail> {
        self.emails.lock().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmailQueue for InMemoryEmailQueue {
    async fn enqueue(&self, email: &OutboundEmail) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService("email queue unavailable".to_string()));
        }
        self.emails.lock().push(email.clone());
        Ok(())
    }
}
