pub mod error;
pub mod selection;
pub mod service;

pub use error::ReminderError;
pub use selection::{due_paid_reminders, due_trial_reminder, DueReminder};
pub use service::{ReminderScheduler, ReminderSettings, TickReport};
