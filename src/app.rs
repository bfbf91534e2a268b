use std::sync::Arc;

use axum::Router;

use crate::{
    controllers::{
        account::AccountController, payment::PaymentController, webhook::WebhookController,
    },
    domain::{
        access::AccessService, auth::JwtManager, notification::EmailComposer,
        reminder::ReminderScheduler, subscription::SubscriptionPolicy, webhook::WebhookService,
    },
    infrastructure::{
        auth::AccessGate,
        clock::Clock,
        config::Config,
        http::build_router,
        payments::PaymentGateway,
        repositories::{EmailQueue, ProfileStore},
    },
};

/// Services and controllers wired from the external collaborators. Shared by
/// the binary and the end-to-end tests.
pub struct AppComponents {
    pub config: Arc<Config>,
    pub store: Arc<dyn ProfileStore>,
    pub policy: Arc<SubscriptionPolicy>,
    pub jwt_manager: Arc<JwtManager>,
    pub access_service: Arc<AccessService>,
    pub access_gate: Arc<AccessGate>,
    pub webhook_service: Arc<WebhookService>,
    pub reminder_scheduler: Arc<ReminderScheduler>,
    pub account_controller: Arc<AccountController>,
    pub payment_controller: Arc<PaymentController>,
    pub webhook_controller: Arc<WebhookController>,
}

impl AppComponents {
    pub fn new(
        config: Config,
        store: Arc<dyn ProfileStore>,
        emails: Arc<dyn EmailQueue>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);

        // 1. Policy and shared collaborators
        let policy = Arc::new(SubscriptionPolicy::new(config.policy_settings()));
        let site = config.site_settings();
        let composer = Arc::new(EmailComposer::new(site.clone(), policy.clone()));
        let jwt_manager = Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
        ));

        // 2. Services
        let access_service = Arc::new(AccessService::new(
            store.clone(),
            policy.clone(),
            clock.clone(),
        ));
        let access_gate = Arc::new(AccessGate::new(
            access_service.clone(),
            config.request_deadline_std(),
        ));
        let webhook_service = Arc::new(WebhookService::new(
            store.clone(),
            emails.clone(),
            gateway.clone(),
            policy.clone(),
            composer.clone(),
            clock.clone(),
            config.webhook_settings(),
        ));
        let reminder_scheduler = Arc::new(ReminderScheduler::new(
            store.clone(),
            emails,
            policy.clone(),
            composer,
            clock,
            config.reminder_settings(),
        ));

        // 3. Controllers
        let account_controller = Arc::new(AccountController::new(
            access_service.clone(),
            config.stripe_yearly_price_id.clone(),
            config.default_subscription_amount,
        ));
        let payment_controller = Arc::new(PaymentController::new(
            gateway,
            config.stripe_yearly_price_id.clone(),
            site,
        ));
        let webhook_controller = Arc::new(WebhookController::new(webhook_service.clone()));

        Self {
            config,
            store,
            policy,
            jwt_manager,
            access_service,
            access_gate,
            webhook_service,
            reminder_scheduler,
            account_controller,
            payment_controller,
            webhook_controller,
        }
    }

    pub fn router(&self, content: Router) -> Router {
        build_router(self, content)
    }
}
