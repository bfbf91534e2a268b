use serde::{Deserialize, Serialize};
use std::fmt;

/// Access classification of a request. Exactly one applies to any user at
/// any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    Unauthenticated,
    Full,
    Trial,
    TrialExpired,
    SubscriptionExpired,
}

impl AccessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Full => "full",
            Self::Trial => "trial",
            Self::TrialExpired => "trial_expired",
            Self::SubscriptionExpired => "subscription_expired",
        }
    }

    /// List views need a signed-in user with trial time or a subscription.
    pub fn can_view_lists(&self) -> bool {
        matches!(self, Self::Full | Self::Trial)
    }

    /// The map stays open to anonymous visitors.
    pub fn can_view_map(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Full | Self::Trial)
    }
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityTags {
    /// Staff and administrators bypass every payment check.
    pub admin: bool,
    /// Identities on the short testing durations.
    pub test_user: bool,
}
