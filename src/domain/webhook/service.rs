use super::event::{checkout_dedup_key, CheckoutSession, Invoice, PaymentEvent};
use super::signature::{verify_signature, SignatureError};
use super::WebhookError;
use crate::domain::notification::EmailComposer;
use crate::domain::profile::Profile;
use crate::domain::subscription::SubscriptionPolicy;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::payments::PaymentGateway;
use crate::infrastructure::repositories::{
    EmailQueue, PaymentApplication, ProfileMutation, ProfileStore,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// What a delivered event did. Every outcome is acknowledged with 200.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Granted {
        user_id: Uuid,
        paid_access_expiry: Option<DateTime<Utc>>,
    },
    /// The event key was already processed.
    Duplicate,
    /// The event could not be matched to a user.
    Orphan,
    /// The event needs no action.
    Ignored,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Granted { .. } => "granted",
            Self::Duplicate => "duplicate",
            Self::Orphan => "orphan",
            Self::Ignored => "ignored",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub secret: Option<String>,
    /// Used when the event carries no amount.
    pub default_amount: Decimal,
    /// Upper bound on store and processor work per delivery.
    pub deadline: Duration,
}

pub struct WebhookService {
    store: Arc<dyn ProfileStore>,
    emails: Arc<dyn EmailQueue>,
    gateway: Arc<dyn PaymentGateway>,
    policy: Arc<SubscriptionPolicy>,
    composer: Arc<EmailComposer>,
    clock: Arc<dyn Clock>,
    settings: WebhookSettings,
}

impl WebhookService {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        emails: Arc<dyn EmailQueue>,
        gateway: Arc<dyn PaymentGateway>,
        policy: Arc<SubscriptionPolicy>,
        composer: Arc<EmailComposer>,
        clock: Arc<dyn Clock>,
        settings: WebhookSettings,
    ) -> Self {
        Self {
            store,
            emails,
            gateway,
            policy,
            composer,
            clock,
            settings,
        }
    }

    /// Verifies, decodes and applies one delivery.
    ///
    /// Nothing is read or written before the signature checks out.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let secret = self
            .settings
            .secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| WebhookError::Config("STRIPE_WEBHOOK_SECRET is not set".to_string()))?;
        let signature = signature.ok_or(SignatureError::Missing)?;
        verify_signature(payload, signature, secret, self.clock.now())?;

        let event = PaymentEvent::parse(payload)?;
        tracing::info!(event_id = %event.event_id(), "Payment event received");

        let outcome = tokio::time::timeout(self.settings.deadline, self.process(event))
            .await
            .map_err(|_| WebhookError::Timeout)??;

        tracing::info!(outcome = outcome.as_str(), "Payment event handled");
        Ok(outcome)
    }

    async fn process(&self, event: PaymentEvent) -> Result<WebhookOutcome, WebhookError> {
        match event {
            PaymentEvent::CheckoutCompleted { event_id, session } => {
                self.checkout_completed(&checkout_dedup_key(&event_id), session)
                    .await
            }
            PaymentEvent::InvoicePaid { invoice, .. } => {
                let key = invoice.dedup_key();
                self.invoice_paid(&key, invoice).await
            }
            PaymentEvent::Unknown { event_type, .. } => {
                tracing::debug!(event_type = %event_type, "Ignoring unhandled event type");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn checkout_completed(
        &self,
        key: &str,
        session: CheckoutSession,
    ) -> Result<WebhookOutcome, WebhookError> {
        if !session.is_paid() {
            tracing::info!(session_id = %session.id, "Checkout completed without payment, ignoring");
            return Ok(WebhookOutcome::Ignored);
        }

        let Some(user_id) = session.user_id() else {
            tracing::warn!(session_id = %session.id, "Checkout session has no usable user_id");
            return Ok(WebhookOutcome::Orphan);
        };

        let now = self.clock.now();
        if self.store.find_by_id(user_id).await?.is_none() {
            let Some(email) = session.email() else {
                tracing::warn!(%user_id, "No profile and no email on checkout session");
                return Ok(WebhookOutcome::Orphan);
            };
            self.store.find_or_create(user_id, email, now).await?;
        }

        let amount = session.amount().unwrap_or(self.settings.default_amount);
        self.grant(key, user_id, amount, now).await
    }

    async fn invoice_paid(&self, key: &str, invoice: Invoice) -> Result<WebhookOutcome, WebhookError> {
        if invoice.is_first_cycle() {
            tracing::debug!(invoice_id = %invoice.id, "First-cycle invoice covered by checkout");
            return Ok(WebhookOutcome::Ignored);
        }

        let email = match (invoice.email(), invoice.customer.as_deref()) {
            (Some(email), _) => Some(email.to_string()),
            (None, Some(customer_id)) => self
                .gateway
                .customer_email(customer_id)
                .await
                .map_err(|e| WebhookError::Gateway(e.to_string()))?,
            (None, None) => None,
        };

        let Some(email) = email else {
            tracing::warn!(invoice_id = %invoice.id, "Invoice has no resolvable customer email");
            return Ok(WebhookOutcome::Orphan);
        };
        let Some(profile) = self.store.find_by_email(&email).await? else {
            tracing::warn!(invoice_id = %invoice.id, "No profile for invoice customer");
            return Ok(WebhookOutcome::Orphan);
        };

        let amount = invoice.amount().unwrap_or(self.settings.default_amount);
        self.grant(key, profile.user_id, amount, self.clock.now()).await
    }

    async fn grant(
        &self,
        key: &str,
        user_id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, WebhookError> {
        let policy = self.policy.clone();
        let mutation: ProfileMutation = Box::new(move |profile: &mut Profile| {
            *profile = policy.grant(profile, amount, now);
        });

        match self.store.apply_payment(key, user_id, now, mutation).await? {
            PaymentApplication::Applied(profile) => {
                tracing::info!(
                    %user_id,
                    expiry = ?profile.paid_access_expiry,
                    amount = %amount,
                    "Paid access granted"
                );
                self.send_confirmation(&profile).await;
                Ok(WebhookOutcome::Granted {
                    user_id,
                    paid_access_expiry: profile.paid_access_expiry,
                })
            }
            PaymentApplication::Duplicate => {
                tracing::info!(event_key = key, "Payment event already processed");
                Ok(WebhookOutcome::Duplicate)
            }
            PaymentApplication::MissingProfile => {
                tracing::warn!(%user_id, "Profile disappeared before grant");
                Ok(WebhookOutcome::Orphan)
            }
        }
    }

    async fn send_confirmation(&self, profile: &Profile) {
        let email = self.composer.payment_confirmation(profile);
        if let Err(e) = self.emails.enqueue(&email).await {
            tracing::warn!(
                user_id = %profile.user_id,
                error = %e,
                "Failed to enqueue payment confirmation"
            );
        }
    }
}
