pub mod email_outbox_repository;
pub mod email_queue;
pub mod memory;
pub mod profile_repository;
pub mod profile_store;

pub use email_outbox_repository::EmailOutboxRepository;
pub use email_queue::EmailQueue;
pub use memory::{InMemoryEmailQueue, InMemoryProfileStore};
pub use profile_repository::ProfileRepository;
pub use profile_store::{PaymentApplication, ProfileMutation, ProfileStore};
