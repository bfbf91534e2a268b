use super::trial::trial_remaining;
use super::{AccessState, IdentityTags};
use crate::domain::profile::Profile;
use crate::domain::subscription::SubscriptionPolicy;
use chrono::{DateTime, Duration, Utc};

/// Classifies a signed-in user.
///
/// Precedence: admin, active paid access, lapsed paid access, trial time
/// left, trial exhausted. A missing profile is `TrialExpired` so callers
/// create one before serving content. Someone who has ever paid never falls
/// back to the trial.
pub fn evaluate(
    profile: Option<&Profile>,
    now: DateTime<Utc>,
    tags: IdentityTags,
    policy: &SubscriptionPolicy,
) -> AccessState {
    if tags.admin {
        return AccessState::Full;
    }

    let Some(profile) = profile else {
        return AccessState::TrialExpired;
    };

    if profile.is_paid_active(now) {
        return AccessState::Full;
    }
    if profile.has_paid_access {
        return AccessState::SubscriptionExpired;
    }

    let budget = policy.tier_for_tags(tags).trial_budget;
    if trial_remaining(profile, now, policy.trial_window(), budget) > Duration::zero() {
        AccessState::Trial
    } else {
        AccessState::TrialExpired
    }
}
