use super::ReminderFlags;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Per-user subscription and trial record.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: Uuid,
    pub email: String,
    /// A paid subscription was granted at some point and never revoked.
    pub has_paid_access: bool,
    /// `None` together with `has_paid_access` means perpetual access.
    pub paid_access_expiry: Option<DateTime<Utc>>,
    pub payment_amount: Option<Decimal>,
    pub trial_window_start: Option<DateTime<Utc>>,
    pub trial_first_use: Option<DateTime<Utc>>,
    pub trial_used_seconds: f64,
    pub reminder_flags: ReminderFlags,
}

impl Profile {
    /// A fresh profile whose trial window opens at `now`.
    pub fn new(user_id: Uuid, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            email: email.into(),
            has_paid_access: false,
            paid_access_expiry: None,
            payment_amount: None,
            trial_window_start: Some(now),
            trial_first_use: None,
            trial_used_seconds: 0.0,
            reminder_flags: ReminderFlags::default(),
        }
    }

    pub fn is_perpetual(&self) -> bool {
        self.has_paid_access && self.paid_access_expiry.is_none()
    }

    pub fn is_paid_active(&self, now: DateTime<Utc>) -> bool {
        self.has_paid_access && self.paid_access_expiry.map_or(true, |expiry| expiry > now)
    }

    pub fn is_paid_expired(&self, now: DateTime<Utc>) -> bool {
        self.has_paid_access && !self.is_paid_active(now)
    }
}
