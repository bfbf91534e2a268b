use crate::domain::shared::{format_interval, parse_interval};
use chrono::Duration;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

const TRIAL_ENDING_KEY: &str = "trial_ending";
const TRIAL_EXPIRED_KEY: &str = "trial_expired";
const SUBSCRIPTION_PREFIX: &str = "subscription_";

/// Identifies one reminder within a trial window or paid cycle.
///
/// Stored as a short string key: `trial_ending`, `trial_expired`, or
/// `subscription_<offset>` where the offset uses interval notation
/// (`subscription_30d`, `subscription_2m`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReminderKind {
    TrialEnding,
    TrialExpiredNotice,
    SubscriptionExpiring { offset_secs: i64 },
}

impl ReminderKind {
    pub fn subscription_expiring(offset: Duration) -> Self {
        Self::SubscriptionExpiring {
            offset_secs: offset.num_seconds(),
        }
    }

    pub fn is_trial(&self) -> bool {
        matches!(self, Self::TrialEnding | Self::TrialExpiredNotice)
    }

    pub fn offset(&self) -> Option<Duration> {
        match self {
            Self::SubscriptionExpiring { offset_secs } => Some(Duration::seconds(*offset_secs)),
            _ => None,
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrialEnding => f.write_str(TRIAL_ENDING_KEY),
            Self::TrialExpiredNotice => f.write_str(TRIAL_EXPIRED_KEY),
            Self::SubscriptionExpiring { offset_secs } => write!(
                f,
                "{}{}",
                SUBSCRIPTION_PREFIX,
                format_interval(Duration::seconds(*offset_secs))
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reminder kind '{0}'")]
pub struct UnknownReminderKind(pub String);

impl FromStr for ReminderKind {
    type Err = UnknownReminderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            TRIAL_ENDING_KEY => Ok(Self::TrialEnding),
            TRIAL_EXPIRED_KEY => Ok(Self::TrialExpiredNotice),
            other => other
                .strip_prefix(SUBSCRIPTION_PREFIX)
                .and_then(|offset| parse_interval(offset).ok())
                .map(Self::subscription_expiring)
                .ok_or_else(|| UnknownReminderKind(other.to_string())),
        }
    }
}

/// Reminders already delivered for the current trial window / paid cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderFlags(BTreeSet<ReminderKind>);

impl ReminderFlags {
    pub fn contains(&self, kind: ReminderKind) -> bool {
        self.0.contains(&kind)
    }

    /// Returns `false` when the flag was already set.
    pub fn insert(&mut self, kind: ReminderKind) -> bool {
        self.0.insert(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReminderKind> {
        self.0.iter()
    }

    pub fn clear_trial(&mut self) {
        self.0.retain(|kind| !kind.is_trial());
    }

    pub fn clear_paid(&mut self) {
        self.0.retain(|kind| kind.is_trial());
    }

    pub fn to_keys(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Unknown keys are dropped so an older binary can still read rows written
    /// by a newer one.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = BTreeSet::new();
        for key in keys {
            match key.as_ref().parse::<ReminderKind>() {
                Ok(kind) => {
                    flags.insert(kind);
                }
                Err(err) => tracing::warn!(error = %err, "Ignoring stored reminder flag"),
            }
        }
        Self(flags)
    }
}

impl FromIterator<ReminderKind> for ReminderFlags {
    fn from_iter<T: IntoIterator<Item = ReminderKind>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
