use super::WebhookError;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const INVOICE_PAID: &str = "invoice.paid";
pub const INVOICE_PAYMENT_SUCCEEDED: &str = "invoice.payment_succeeded";

/// Billing reason of the invoice raised together with the first checkout.
const FIRST_CYCLE_BILLING_REASON: &str = "subscription_create";

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Minor currency units.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }

    /// User the session was opened for, from `metadata.user_id`.
    pub fn user_id(&self) -> Option<Uuid> {
        self.metadata
            .get("user_id")
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    }

    pub fn email(&self) -> Option<&str> {
        self.customer_email
            .as_deref()
            .or_else(|| {
                self.customer_details
                    .as_ref()
                    .and_then(|details| details.email.as_deref())
            })
            .filter(|email| !email.trim().is_empty())
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount_total.map(minor_units)
    }
}

/// Processed-event key for a checkout delivery.
pub fn checkout_dedup_key(event_id: &str) -> String {
    format!("event:{}", event_id)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Invoice {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    /// Minor currency units.
    #[serde(default)]
    pub amount_paid: Option<i64>,
    #[serde(default)]
    pub billing_reason: Option<String>,
}

impl Invoice {
    /// First-cycle invoices duplicate the checkout grant.
    pub fn is_first_cycle(&self) -> bool {
        self.billing_reason.as_deref() == Some(FIRST_CYCLE_BILLING_REASON)
    }

    pub fn email(&self) -> Option<&str> {
        self.customer_email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount_paid.map(minor_units)
    }

    /// Processed-event key, shared by `invoice.paid` and
    /// `invoice.payment_succeeded` so one invoice extends access once.
    pub fn dedup_key(&self) -> String {
        format!("invoice:{}", self.id)
    }
}

/// Payment processor event, reduced to the kinds the access core acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentEvent {
    CheckoutCompleted { event_id: String, session: CheckoutSession },
    InvoicePaid { event_id: String, invoice: Invoice },
    Unknown { event_id: String, event_type: String },
}

impl PaymentEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        let envelope: EventEnvelope = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::Payload(format!("invalid event envelope: {}", e)))?;

        let event = match envelope.event_type.as_str() {
            CHECKOUT_COMPLETED => PaymentEvent::CheckoutCompleted {
                session: serde_json::from_value(envelope.data.object)
                    .map_err(|e| WebhookError::Payload(format!("invalid checkout session: {}", e)))?,
                event_id: envelope.id,
            },
            INVOICE_PAID | INVOICE_PAYMENT_SUCCEEDED => PaymentEvent::InvoicePaid {
                invoice: serde_json::from_value(envelope.data.object)
                    .map_err(|e| WebhookError::Payload(format!("invalid invoice: {}", e)))?,
                event_id: envelope.id,
            },
            _ => PaymentEvent::Unknown {
                event_type: envelope.event_type.clone(),
                event_id: envelope.id,
            },
        };

        Ok(event)
    }

    pub fn event_id(&self) -> &str {
        match self {
            Self::CheckoutCompleted { event_id, .. }
            | Self::InvoicePaid { event_id, .. }
            | Self::Unknown { event_id, .. } => event_id,
        }
    }
}

fn minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}
