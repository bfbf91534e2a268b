use crate::domain::profile::{Profile, ReminderFlags, ReminderKind};
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use crate::infrastructure::repositories::{PaymentApplication, ProfileMutation, ProfileStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

const PROFILE_COLUMNS: &str = "user_id, email, has_paid_access, paid_access_expiry, payment_amount, \
     trial_window_start, trial_first_use, trial_used_seconds, reminder_flags";

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    email: String,
    has_paid_access: bool,
    paid_access_expiry: Option<DateTime<Utc>>,
    payment_amount: Option<Decimal>,
    trial_window_start: Option<DateTime<Utc>>,
    trial_first_use: Option<DateTime<Utc>>,
    trial_used_seconds: f64,
    reminder_flags: Vec<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            user_id: row.user_id,
            email: row.email,
            has_paid_access: row.has_paid_access,
            paid_access_expiry: row.paid_access_expiry,
            payment_amount: row.payment_amount,
            trial_window_start: row.trial_window_start,
            trial_first_use: row.trial_first_use,
            trial_used_seconds: row.trial_used_seconds,
            reminder_flags: ReminderFlags::from_keys(row.reminder_flags),
        }
    }
}

/// Postgres-backed profile store.
pub struct ProfileRepository {
    pool: Arc<DbPool>,
}

impl ProfileRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, sql: &str, a: DateTime<Utc>, b: Option<DateTime<Utc>>) -> AppResult<Vec<Profile>> {
        let pool = self.pool.as_ref();
        let mut query = sqlx::query_as::<_, ProfileRow>(sql).bind(a);
        if let Some(b) = b {
            query = query.bind(b);
        }
        let rows = query.fetch_all(pool).await?;

        Ok(rows.into_iter().map(Profile::from).collect())
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Profile>> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS} FROM profiles
            WHERE LOWER(email) = LOWER($1)
            ORDER BY has_paid_access DESC,
                     (has_paid_access AND paid_access_expiry IS NULL) DESC,
                     paid_access_expiry DESC NULLS LAST,
                     user_id
            LIMIT 1
            "#
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Profile::from))
    }

    async fn find_or_create(&self, user_id: Uuid, email: &str, now: DateTime<Utc>) -> AppResult<Profile> {
        if let Some(profile) = self.find_by_id(user_id).await? {
            return Ok(profile);
        }

        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, email, trial_window_start, created_at, updated_at)
            VALUES ($1, $2, $3, $3, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(email.trim())
        .bind(now)
        .execute(pool)
        .await?;

        self.find_by_id(user_id).await?.ok_or_else(|| {
            crate::error::AppError::Internal(format!(
                "profile for user {} missing after insert",
                user_id
            ))
        })
    }

    async fn start_trial(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET trial_first_use = $2, updated_at = $2
            WHERE user_id = $1
              AND trial_first_use IS NULL
              AND has_paid_access = FALSE
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn reset_trial_window(
        &self,
        user_id: Uuid,
        expected_start: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET trial_window_start = $2,
                trial_first_use = NULL,
                trial_used_seconds = 0,
                reminder_flags = ARRAY(
                    SELECT flag FROM UNNEST(reminder_flags) AS flag
                    WHERE flag NOT LIKE 'trial\_%'
                ),
                updated_at = $2
            WHERE user_id = $1
              AND trial_window_start IS NOT DISTINCT FROM $3
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(expected_start)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn apply_payment(
        &self,
        event_key: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
        mutation: ProfileMutation,
    ) -> AppResult<PaymentApplication> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO processed_events (event_key, processed_at)
            VALUES ($1, $2)
            ON CONFLICT (event_key) DO NOTHING
            "#,
        )
        .bind(event_key)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(PaymentApplication::Duplicate);
        }

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(PaymentApplication::MissingProfile);
        };

        let mut profile = Profile::from(row);
        mutation(&mut profile);

        sqlx::query(
            r#"
            UPDATE profiles
            SET has_paid_access = $2,
                paid_access_expiry = $3,
                payment_amount = $4,
                reminder_flags = $5,
                updated_at = $6
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(profile.has_paid_access)
        .bind(profile.paid_access_expiry)
        .bind(profile.payment_amount)
        .bind(profile.reminder_flags.to_keys())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PaymentApplication::Applied(profile))
    }

    async fn claim_reminder(&self, user_id: Uuid, kind: ReminderKind) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET reminder_flags = array_append(reminder_flags, $2), updated_at = NOW()
            WHERE user_id = $1
              AND NOT ($2 = ANY(reminder_flags))
            "#,
        )
        .bind(user_id)
        .bind(kind.to_string())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn trial_reminder_candidates(&self, first_use_after: DateTime<Utc>) -> AppResult<Vec<Profile>> {
        self.fetch_many(
            &format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles \
                 WHERE has_paid_access = FALSE AND trial_first_use > $1"
            ),
            first_use_after,
            None,
        )
        .await
    }

    async fn paid_reminder_candidates(
        &self,
        now: DateTime<Utc>,
        horizon: DateTime<Utc>,
    ) -> AppResult<Vec<Profile>> {
        self.fetch_many(
            &format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles \
                 WHERE has_paid_access = TRUE \
                   AND paid_access_expiry > $1 AND paid_access_expiry <= $2"
            ),
            now,
            Some(horizon),
        )
        .await
    }

    async fn purge_processed_events(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("DELETE FROM processed_events WHERE processed_at < $1")
            .bind(before)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
