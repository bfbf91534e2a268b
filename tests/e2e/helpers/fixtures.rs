use capacity_access::{
    domain::profile::{Profile, ReminderKind},
    infrastructure::{
        clock::{Clock, ManualClock},
        repositories::{InMemoryProfileStore, ProfileStore},
    },
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub struct TestFixtures {
    store: Arc<InMemoryProfileStore>,
    clock: Arc<ManualClock>,
}

impl TestFixtures {
    pub fn new(store: Arc<InMemoryProfileStore>, clock: Arc<ManualClock>) -> Self {
        Self { store, clock }
    }

    /// Fresh trial profile whose window opened at the current test instant.
    pub async fn create_trial_user(&self, email: &str) -> Profile {
        let profile = Profile::new(Uuid::new_v4(), email, self.clock.now());
        self.store.put(profile.clone()).await;
        profile
    }

    /// Trial profile whose clock started at `first_use`.
    pub async fn create_used_trial_user(
        &self,
        email: &str,
        window_start: DateTime<Utc>,
        first_use: DateTime<Utc>,
    ) -> Profile {
        let mut profile = Profile::new(Uuid::new_v4(), email, window_start);
        profile.trial_first_use = Some(first_use);
        self.store.put(profile.clone()).await;
        profile
    }

    /// Paid profile; `expiry = None` is perpetual access.
    pub async fn create_paid_user(&self, email: &str, expiry: Option<DateTime<Utc>>) -> Profile {
        self.create_paid_user_with_flags(email, expiry, &[]).await
    }

    pub async fn create_paid_user_with_flags(
        &self,
        email: &str,
        expiry: Option<DateTime<Utc>>,
        flags: &[ReminderKind],
    ) -> Profile {
        let mut profile = Profile::new(Uuid::new_v4(), email, self.clock.now() - Duration::days(400));
        profile.has_paid_access = true;
        profile.paid_access_expiry = expiry;
        profile.payment_amount = Some(Decimal::new(500, 2));
        for kind in flags {
            profile.reminder_flags.insert(*kind);
        }
        self.store.put(profile.clone()).await;
        profile
    }

    pub async fn profile(&self, user_id: Uuid) -> Profile {
        self.store
            .find_by_id(user_id)
            .await
            .expect("in-memory store does not fail")
            .expect("profile should exist")
    }
}
