use crate::domain::notification::OutboundEmail;
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use crate::infrastructure::repositories::EmailQueue;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Durable outbox drained by the mail delivery worker.
pub struct EmailOutboxRepository {
    pool: Arc<DbPool>,
}

impl EmailOutboxRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailQueue for EmailOutboxRepository {
    async fn enqueue(&self, email: &OutboundEmail) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            INSERT INTO email_outbox (id, recipient, sender, subject, body_text, body_html, kind, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&email.to)
        .bind(&email.from)
        .bind(&email.subject)
        .bind(&email.body_text)
        .bind(&email.body_html)
        .bind(email.kind.to_string())
        .execute(pool)
        .await?;

        tracing::debug!(recipient = %email.to, kind = %email.kind, "Email queued");

        Ok(())
    }
}
