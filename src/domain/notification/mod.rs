pub mod composer;
pub mod email;

pub use composer::{EmailComposer, SiteSettings};
pub use email::{EmailKind, OutboundEmail};
