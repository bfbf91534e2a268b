pub mod error;
pub mod event;
pub mod service;
pub mod signature;

pub use error::WebhookError;
pub use event::{CheckoutSession, Invoice, PaymentEvent};
pub use service::{WebhookOutcome, WebhookService, WebhookSettings};
pub use signature::{sign_payload, verify_signature, SignatureError};
