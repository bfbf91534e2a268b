use super::AccessState;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for GET /accounts/account/ and GET /api/me/access
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub state: AccessState,
    pub can_view_lists: bool,
    pub can_view_map: bool,
    pub trial_remaining_seconds: Option<i64>,
    pub trial_window_resets_at: Option<DateTime<Utc>>,
    pub paid_access_expiry: Option<DateTime<Utc>>,
    pub payment_amount: Option<Decimal>,
    pub subscription_type: Option<String>,
    pub message: Option<AccessMessage>,
}

/// Call to action shown to users who cannot use gated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMessage {
    pub title: String,
    pub message: String,
    pub action: String,
    pub url: String,
}
