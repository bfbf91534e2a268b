pub mod stripe;

pub use stripe::StripeClient;

use crate::domain::subscription::CheckoutSessionRequest;
use crate::error::AppResult;
use async_trait::async_trait;

/// Outbound calls to the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a hosted checkout session and returns the URL to redirect to.
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> AppResult<String>;

    /// Email on file for a processor customer, if any.
    async fn customer_email(&self, customer_id: &str) -> AppResult<Option<String>>;
}
