use crate::domain::notification::OutboundEmail;
use crate::error::AppResult;
use async_trait::async_trait;

/// Hand-off point to the delivery collaborator. Enqueued mail is retried by
/// the collaborator, never by the caller.
#[async_trait]
pub trait EmailQueue: Send + Sync {
    async fn enqueue(&self, email: &OutboundEmail) -> AppResult<()>;
}
