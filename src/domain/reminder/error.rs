use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("profile store error: {0}")]
    Store(String),
}

impl From<AppError> for ReminderError {
    fn from(err: AppError) -> Self {
        ReminderError::Store(err.to_string())
    }
}

impl From<ReminderError> for AppError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::Store(msg) => AppError::Internal(msg),
        }
    }
}
