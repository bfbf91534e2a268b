pub mod checkout;
pub mod dto;
pub mod policy;

pub use checkout::{CheckoutSessionRequest, CheckoutUrls, ACCESS_LEVEL_FULL};
pub use dto::PaymentOfferResponse;
pub use policy::{PerpetualRenewal, PolicySettings, PolicyTier, SubscriptionPolicy};
