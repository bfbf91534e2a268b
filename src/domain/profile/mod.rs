pub mod model;
pub mod reminder;

pub use model::Profile;
pub use reminder::{ReminderFlags, ReminderKind, UnknownReminderKind};
