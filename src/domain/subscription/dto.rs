use crate::domain::access::AccessState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response for GET /accounts/payment-required/ and /accounts/payment-selection/
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentOfferResponse {
    pub title: String,
    pub message: String,
    pub subscription_type: String,
    pub amount: Decimal,
    pub price_id: Option<String>,
    pub initiate_url: String,
    pub state: Option<AccessState>,
}
