use serde::Serialize;
use uuid::Uuid;

pub const ACCESS_LEVEL_FULL: &str = "full";

/// Absolute return URLs handed to the payment processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Everything the processor needs to open a yearly checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSessionRequest {
    pub price_id: String,
    pub user_id: Uuid,
    pub access_level: String,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: String,
}

impl CheckoutSessionRequest {
    pub fn yearly(price_id: &str, user_id: Uuid, customer_email: &str, urls: CheckoutUrls) -> Self {
        Self {
            price_id: price_id.to_string(),
            user_id,
            access_level: ACCESS_LEVEL_FULL.to_string(),
            success_url: urls.success_url,
            cancel_url: urls.cancel_url,
            customer_email: customer_email.to_string(),
        }
    }
}
