use axum::{extract::State, Extension, Json};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::{
    domain::{
        access::{AccessService, AccessSnapshot, AccessState, AccessSummary},
        subscription::PaymentOfferResponse,
    },
    error::AppResult,
    infrastructure::{auth::AuthUser, http::routes},
};

pub struct AccountController {
    access_service: Arc<AccessService>,
    price_id: Option<String>,
    amount: Decimal,
}

impl AccountController {
    pub fn new(access_service: Arc<AccessService>, price_id: Option<String>, amount: Decimal) -> Self {
        Self {
            access_service,
            price_id,
            amount,
        }
    }

    /// GET /accounts/account/ - Access summary for the signed-in user
    pub async fn get_account(
        State(controller): State<Arc<AccountController>>,
        auth_user: AuthUser,
        snapshot: Option<Extension<AccessSnapshot>>,
    ) -> AppResult<Json<AccessSummary>> {
        controller.summary(&auth_user, snapshot).await
    }

    /// GET /api/me/access - Same summary for API clients
    pub async fn get_access(
        State(controller): State<Arc<AccountController>>,
        auth_user: AuthUser,
        snapshot: Option<Extension<AccessSnapshot>>,
    ) -> AppResult<Json<AccessSummary>> {
        controller.summary(&auth_user, snapshot).await
    }

    /// GET /accounts/payment-required/ - Shown when the trial is used up
    pub async fn payment_required(
        State(controller): State<Arc<AccountController>>,
        auth_user: Option<AuthUser>,
    ) -> AppResult<Json<PaymentOfferResponse>> {
        let state = controller.state_of(auth_user.as_ref()).await?;
        let (title, message) = match state {
            Some(AccessState::SubscriptionExpired) => (
                "Subscription Expired",
                "Your yearly subscription has expired. Renew to restore unlimited access.",
            ),
            _ => (
                "Payment Required",
                "Your free trial for this month is used up. Subscribe for unlimited access.",
            ),
        };
        Ok(Json(controller.offer(auth_user.as_ref(), title, message, state)))
    }

    /// GET /accounts/payment-selection/ - Subscription options
    pub async fn payment_selection(
        State(controller): State<Arc<AccountController>>,
        auth_user: Option<AuthUser>,
    ) -> AppResult<Json<PaymentOfferResponse>> {
        let state = controller.state_of(auth_user.as_ref()).await?;
        Ok(Json(controller.offer(
            auth_user.as_ref(),
            "Get Full Access",
            "Unlimited searches, full map views and exports for one year.",
            state,
        )))
    }

    async fn summary(
        &self,
        auth_user: &AuthUser,
        snapshot: Option<Extension<AccessSnapshot>>,
    ) -> AppResult<Json<AccessSummary>> {
        let snapshot = match snapshot {
            Some(Extension(snapshot)) => snapshot,
            None => self.access_service.inspect(auth_user).await?,
        };
        Ok(Json(self.access_service.summary(&snapshot)))
    }

    async fn state_of(&self, auth_user: Option<&AuthUser>) -> AppResult<Option<AccessState>> {
        match auth_user {
            Some(user) => Ok(Some(self.access_service.inspect(user).await?.state)),
            None => Ok(None),
        }
    }

    fn offer(
        &self,
        auth_user: Option<&AuthUser>,
        title: &str,
        message: &str,
        state: Option<AccessState>,
    ) -> PaymentOfferResponse {
        let subscription_type = auth_user
            .map(|user| self.access_service.policy().subscription_type_display(&user.email))
            .unwrap_or_else(|| "yearly subscription".to_string());

        PaymentOfferResponse {
            title: title.to_string(),
            message: message.to_string(),
            subscription_type,
            amount: self.amount,
            price_id: self.price_id.clone(),
            initiate_url: routes::INITIATE_PAYMENT_PATH.to_string(),
            state,
        }
    }
}
