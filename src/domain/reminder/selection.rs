//! Decides which reminders are due for a profile at an instant. No I/O.

use crate::domain::access::trial::{trial_remaining, window_elapsed};
use crate::domain::profile::{Profile, ReminderKind};
use crate::domain::subscription::SubscriptionPolicy;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueReminder {
    pub kind: ReminderKind,
    /// Trial time left, or time until the subscription expires.
    pub remaining: Duration,
}

/// Trial reminder owed to `profile`, if any.
///
/// `TrialEnding` fires once the remaining budget is within the identity's
/// threshold, `TrialExpiredNotice` once it is used up. Profiles that paid,
/// never started the trial, or sit in an elapsed window get nothing.
pub fn due_trial_reminder(
    profile: &Profile,
    now: DateTime<Utc>,
    policy: &SubscriptionPolicy,
) -> Option<DueReminder> {
    if profile.has_paid_access || profile.trial_first_use.is_none() {
        return None;
    }
    if window_elapsed(profile, now, policy.trial_window()) {
        return None;
    }

    let tier = policy.tier_for(&profile.email);
    let remaining = trial_remaining(profile, now, policy.trial_window(), tier.trial_budget);

    let kind = if remaining <= Duration::zero() {
        ReminderKind::TrialExpiredNotice
    } else if remaining <= tier.trial_reminder_threshold {
        ReminderKind::TrialEnding
    } else {
        return None;
    };

    (!profile.reminder_flags.contains(kind)).then_some(DueReminder { kind, remaining })
}

/// Renewal reminders owed to `profile`.
///
/// An offset fires while `now` lies within `tolerance` of `expiry - offset`
/// and its flag is unset.
pub fn due_paid_reminders(
    profile: &Profile,
    now: DateTime<Utc>,
    policy: &SubscriptionPolicy,
    tolerance: Duration,
) -> Vec<DueReminder> {
    let Some(expiry) = profile.paid_access_expiry.filter(|_| profile.has_paid_access) else {
        return Vec::new();
    };
    if expiry <= now {
        return Vec::new();
    }

    policy
        .reminder_offsets_for(&profile.email)
        .iter()
        .filter(|offset| {
            let target = expiry - **offset;
            now >= target - tolerance && now <= target + tolerance
        })
        .map(|offset| ReminderKind::subscription_expiring(*offset))
        .filter(|kind| !profile.reminder_flags.contains(*kind))
        .map(|kind| DueReminder {
            kind,
            remaining: expiry - now,
        })
        .collect()
}
