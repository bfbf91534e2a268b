use crate::domain::access::IdentityTags;
use crate::domain::profile::Profile;
use crate::domain::shared::format_interval;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

/// Durations that apply to one class of identity.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTier {
    pub subscription_duration: Duration,
    /// Offsets before expiry at which renewal reminders fire.
    pub reminder_offsets: Vec<Duration>,
    pub trial_budget: Duration,
    /// A trial reminder fires once the remaining budget drops to this value.
    pub trial_reminder_threshold: Duration,
}

impl PolicyTier {
    pub fn production() -> Self {
        Self {
            subscription_duration: Duration::days(365),
            reminder_offsets: vec![Duration::days(30), Duration::days(7)],
            trial_budget: Duration::hours(168),
            trial_reminder_threshold: Duration::hours(24),
        }
    }

    pub fn testing() -> Self {
        Self {
            subscription_duration: Duration::minutes(5),
            reminder_offsets: vec![Duration::minutes(2)],
            trial_budget: Duration::minutes(5),
            trial_reminder_threshold: Duration::minutes(2),
        }
    }
}

/// What a renewal does to a profile with perpetual paid access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerpetualRenewal {
    /// Record the payment, keep access perpetual.
    Keep,
    /// Start a bounded cycle from now.
    Bounded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolicySettings {
    pub production: PolicyTier,
    pub testing: PolicyTier,
    pub test_identities: Vec<String>,
    pub trial_window: Duration,
    pub perpetual_renewal: PerpetualRenewal,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            production: PolicyTier::production(),
            testing: PolicyTier::testing(),
            test_identities: Vec::new(),
            trial_window: Duration::days(30),
            perpetual_renewal: PerpetualRenewal::Keep,
        }
    }
}

/// Maps identities to subscription durations and reminder schedules, and
/// applies grants. Everything here is pure; persistence lives with the
/// callers.
#[derive(Debug, Clone)]
pub struct SubscriptionPolicy {
    settings: PolicySettings,
}

impl SubscriptionPolicy {
    pub fn new(mut settings: PolicySettings) -> Self {
        for tier in [&mut settings.production, &mut settings.testing] {
            tier.reminder_offsets.sort_by(|a, b| b.cmp(a));
            tier.reminder_offsets.dedup();
        }
        settings.test_identities = settings
            .test_identities
            .iter()
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();

        Self { settings }
    }

    pub fn is_test_identity(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.settings.test_identities.iter().any(|id| *id == email)
    }

    pub fn identity_tags(&self, email: &str, admin: bool) -> IdentityTags {
        IdentityTags {
            admin,
            test_user: self.is_test_identity(email),
        }
    }

    pub fn tier_for(&self, email: &str) -> &PolicyTier {
        self.tier(self.is_test_identity(email))
    }

    pub fn tier_for_tags(&self, tags: IdentityTags) -> &PolicyTier {
        self.tier(tags.test_user)
    }

    fn tier(&self, test_user: bool) -> &PolicyTier {
        if test_user {
            &self.settings.testing
        } else {
            &self.settings.production
        }
    }

    pub fn duration_for(&self, email: &str) -> Duration {
        self.tier_for(email).subscription_duration
    }

    /// Offsets before expiry, largest first.
    pub fn reminder_offsets_for(&self, email: &str) -> &[Duration] {
        &self.tier_for(email).reminder_offsets
    }

    pub fn trial_budget_for(&self, email: &str) -> Duration {
        self.tier_for(email).trial_budget
    }

    pub fn trial_window(&self) -> Duration {
        self.settings.trial_window
    }

    /// Largest reminder offset across all tiers; bounds the paid reminder scan.
    pub fn max_reminder_offset(&self) -> Duration {
        self.settings
            .production
            .reminder_offsets
            .iter()
            .chain(self.settings.testing.reminder_offsets.iter())
            .copied()
            .max()
            .unwrap_or_else(Duration::zero)
    }

    /// Grants (or renews) paid access.
    ///
    /// Expiry extends from `max(now, current expiry)` so a renewal never
    /// shortens an active cycle; paid reminder flags are cleared because a
    /// new cycle starts.
    pub fn grant(&self, profile: &Profile, amount: Decimal, now: DateTime<Utc>) -> Profile {
        let mut next = profile.clone();
        next.has_paid_access = true;
        next.payment_amount = Some(amount);

        if profile.is_perpetual() && self.settings.perpetual_renewal == PerpetualRenewal::Keep {
            tracing::info!(
                user_id = %profile.user_id,
                "Renewal recorded on perpetual access, expiry left open"
            );
            return next;
        }

        let base = profile
            .paid_access_expiry
            .filter(|_| profile.has_paid_access)
            .map_or(now, |expiry| expiry.max(now));
        next.paid_access_expiry = Some(base + self.duration_for(&profile.email));
        next.reminder_flags.clear_paid();

        next
    }

    /// Human readable name of the subscription an identity receives.
    pub fn subscription_type_display(&self, email: &str) -> String {
        if self.is_test_identity(email) {
            let duration = self.settings.testing.subscription_duration;
            if duration < Duration::hours(1) {
                format!("{}-minute testing subscription", duration.num_minutes())
            } else {
                format!("{} testing subscription", format_interval(duration))
            }
        } else {
            "yearly subscription".to_string()
        }
    }
}

impl Default for SubscriptionPolicy {
    fn default() -> Self {
        Self::new(PolicySettings::default())
    }
}
