use crate::domain::profile::ReminderKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    PaymentConfirmation,
    Reminder(ReminderKind),
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PaymentConfirmation => f.write_str("payment_confirmation"),
            Self::Reminder(kind) => write!(f, "reminder:{}", kind),
        }
    }
}

/// A message ready for the delivery collaborator. The core only records that
/// it was enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
    pub kind: EmailKind,
}
