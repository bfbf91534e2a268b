use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("profile store error: {0}")]
    Store(String),
    #[error("access evaluation exceeded its deadline")]
    Timeout,
}

impl From<AppError> for AccessError {
    fn from(err: AppError) -> Self {
        AccessError::Store(err.to_string())
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Store(msg) => AppError::Internal(msg),
            AccessError::Timeout => AppError::Timeout("access evaluation".to_string()),
        }
    }
}
