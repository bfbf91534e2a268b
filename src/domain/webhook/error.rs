use super::SignatureError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook not configured: {0}")]
    Config(String),
    #[error("signature rejected: {0}")]
    Signature(#[from] SignatureError),
    #[error("malformed event payload: {0}")]
    Payload(String),
    #[error("profile store error: {0}")]
    Store(String),
    #[error("payment processor error: {0}")]
    Gateway(String),
    #[error("webhook processing exceeded its deadline")]
    Timeout,
}

impl From<AppError> for WebhookError {
    fn from(err: AppError) -> Self {
        WebhookError::Store(err.to_string())
    }
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Config(msg) => AppError::Config(msg),
            WebhookError::Signature(err) => AppError::InvalidSignature(err.to_string()),
            WebhookError::Payload(msg) => AppError::BadRequest(msg),
            WebhookError::Store(msg) => AppError::Internal(msg),
            WebhookError::Gateway(msg) => AppError::ExternalService(msg),
            WebhookError::Timeout => AppError::Timeout("webhook processing".to_string()),
        }
    }
}
