use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{domain::webhook::WebhookService, error::AppResult};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
    pub outcome: &'static str,
}

pub struct WebhookController {
    webhook_service: Arc<WebhookService>,
}

impl WebhookController {
    pub fn new(webhook_service: Arc<WebhookService>) -> Self {
        Self { webhook_service }
    }

    /// POST /accounts/stripe/webhook/ - Payment processor events
    pub async fn receive(
        State(controller): State<Arc<WebhookController>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> AppResult<Json<WebhookResponse>> {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());

        let outcome = controller.webhook_service.handle(&body, signature).await?;

        Ok(Json(WebhookResponse {
            received: true,
            outcome: outcome.as_str(),
        }))
    }
}
