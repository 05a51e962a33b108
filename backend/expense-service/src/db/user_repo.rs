use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{CredentialStore, PgStore};
use crate::error::{ApiError, Result};
use crate::models::{NewUser, User};

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn create(&self, draft: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash, "isEmailVerified",
                               "emailVerificationToken", "emailVerificationExpires",
                               "loginAttempts", created_at, updated_at)
            VALUES (gen_random_uuid(), $1, $2, $3, false, $4, $5, 0,
                    CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            RETURNING *
            "#,
        )
        .bind(&draft.email)
        .bind(&draft.name)
        .bind(&draft.password_hash)
        .bind(&draft.verification_token)
        .bind(draft.verification_expires)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if e.to_string().contains("unique constraint") {
                ApiError::AccountExists
            } else {
                ApiError::Database(e.to_string())
            }
        })?;

        Ok(user)
    }

    async fn set_verification_token(
        &self,
        id: Uuid,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET "emailVerificationToken" = $1,
                "emailVerificationExpires" = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            "#,
        )
        .bind(token)
        .bind(expires)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET "isEmailVerified" = true,
                "emailVerificationToken" = NULL,
                "emailVerificationExpires" = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE "emailVerificationToken" = $1 AND "emailVerificationExpires" > $2
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn set_reset_token(&self, id: Uuid, token: &str, expires: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET "passwordResetToken" = $1,
                "passwordResetExpires" = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            "#,
        )
        .bind(token)
        .bind(expires)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2,
                "passwordResetToken" = NULL,
                "passwordResetExpires" = NULL,
                "loginAttempts" = 0,
                "lockUntil" = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE "passwordResetToken" = $1 AND "passwordResetExpires" > $3
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(new_password_hash)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;

        Ok(user)
    }

    async fn increment_login_attempts(&self, id: Uuid) -> Result<i32> {
        let attempts = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
            SET "loginAttempts" = "loginAttempts" + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING "loginAttempts"
            "#,
        )
        .bind(id)
        .fetch_one(self.pool())
        .await?;

        Ok(attempts)
    }

    async fn lock_account(&self, id: Uuid, until: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET "lockUntil" = $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            "#,
        )
        .bind(until)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn clear_lockout(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET "loginAttempts" = 0,
                "lockUntil" = NULL,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn record_login(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET "lastLogin" = CURRENT_TIMESTAMP,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
