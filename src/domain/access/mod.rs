pub mod dto;
pub mod error;
pub mod evaluator;
pub mod service;
pub mod state;
pub mod trial;

pub use dto::{AccessMessage, AccessSummary};
pub use error::AccessError;
pub use evaluator::evaluate;
pub use service::{AccessService, AccessSnapshot};
pub use state::{AccessState, IdentityTags};
pub use trial::{trial_remaining, TrialTimer};
