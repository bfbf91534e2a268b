use crate::domain::subscription::CheckoutSessionRequest;
use crate::error::{AppError, AppResult};
use crate::infrastructure::payments::PaymentGateway;
use async_trait::async_trait;
use serde::Deserialize;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    email: Option<String>,
}

pub struct StripeClient {
    secret_key: Option<String>,
    api_base: String,
    http_client: reqwest::Client,
}

impl StripeClient {
    pub fn new(secret_key: Option<String>, api_base: String) -> Self {
        Self {
            secret_key: secret_key.filter(|key| !key.is_empty()),
            api_base: api_base.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    fn secret_key(&self) -> AppResult<&str> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| AppError::Config("STRIPE_SECRET_KEY is not set".to_string()))
    }

    async fn error_text(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string())
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> AppResult<String> {
        let secret_key = self.secret_key()?;
        let user_id = request.user_id.to_string();
        let params = [
            ("mode", "subscription"),
            ("payment_method_types[]", "card"),
            ("line_items[0][price]", request.price_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("success_url", request.success_url.as_str()),
            ("cancel_url", request.cancel_url.as_str()),
            ("customer_email", request.customer_email.as_str()),
            ("metadata[user_id]", user_id.as_str()),
            ("metadata[access_level]", request.access_level.as_str()),
            ("metadata[subscription_type]", "yearly"),
            ("subscription_data[metadata][user_id]", user_id.as_str()),
        ];

        let response = self
            .http_client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Stripe checkout request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = Self::error_text(response).await;
            return Err(AppError::ExternalService(format!(
                "Stripe checkout request failed: {}",
                error_text
            )));
        }

        let session = response
            .json::<CheckoutSessionResponse>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse Stripe session: {}", e)))?;

        session
            .url
            .ok_or_else(|| AppError::ExternalService("Stripe session has no URL".to_string()))
    }

    async fn customer_email(&self, customer_id: &str) -> AppResult<Option<String>> {
        let secret_key = self.secret_key()?;

        let response = self
            .http_client
            .get(format!("{}/v1/customers/{}", self.api_base, customer_id))
            .bearer_auth(secret_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Stripe customer lookup failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let error_text = Self::error_text(response).await;
            return Err(AppError::ExternalService(format!(
                "Stripe customer lookup failed: {}",
                error_text
            )));
        }

        let customer = response
            .json::<CustomerResponse>()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse Stripe customer: {}", e)))?;

        Ok(customer.email.filter(|email| !email.is_empty()))
    }
}
