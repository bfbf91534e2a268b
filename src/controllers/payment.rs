use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::{
    domain::{
        notification::SiteSettings,
        subscription::{CheckoutSessionRequest, CheckoutUrls},
    },
    error::{AppError, AppResult},
    infrastructure::{auth::AuthUser, http::routes, payments::PaymentGateway},
};

pub struct PaymentController {
    gateway: Arc<dyn PaymentGateway>,
    price_id: Option<String>,
    site: SiteSettings,
}

impl PaymentController {
    pub fn new(gateway: Arc<dyn PaymentGateway>, price_id: Option<String>, site: SiteSettings) -> Self {
        Self {
            gateway,
            price_id,
            site,
        }
    }

    /// POST /accounts/initiate-payment/ - Open a checkout session and send the
    /// user to it
    pub async fn initiate(
        State(controller): State<Arc<PaymentController>>,
        auth_user: AuthUser,
    ) -> AppResult<Redirect> {
        let price_id = controller
            .price_id
            .as_deref()
            .ok_or_else(|| AppError::Config("STRIPE_YEARLY_PRICE_ID is not set".to_string()))?;

        let request = CheckoutSessionRequest::yearly(
            price_id,
            auth_user.user_id,
            &auth_user.email,
            CheckoutUrls {
                success_url: format!("{}?payment=success", controller.site.url(routes::ACCOUNT_PATH)),
                cancel_url: controller.site.url(routes::PAYMENT_SELECTION_PATH),
            },
        );

        let checkout_url = controller.gateway.create_checkout_session(&request).await?;
        tracing::info!(user_id = %auth_user.user_id, "Checkout session created");

        Ok(Redirect::to(&checkout_url))
    }

    /// GET /accounts/initiate-payment/ - Payment must be started from the
    /// selection page
    pub async fn initiate_get() -> Response {
        (StatusCode::FOUND, [(LOCATION, routes::PAYMENT_SELECTION_PATH)]).into_response()
    }
}
