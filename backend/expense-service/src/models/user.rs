use chrono::{DateTime, Utc};
/// User model
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Identity and credential record.
///
/// The camelCase column names interoperate with pre-existing data sets and
/// must not be renamed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(rename = "isEmailVerified")]
    #[serde(rename = "isEmailVerified")]
    pub is_email_verified: bool,
    #[sqlx(rename = "emailVerificationToken")]
    #[serde(rename = "emailVerificationToken", skip_serializing)]
    pub email_verification_token: Option<String>,
    #[sqlx(rename = "emailVerificationExpires")]
    #[serde(rename = "emailVerificationExpires", skip_serializing)]
    pub email_verification_expires: Option<DateTime<Utc>>,
    #[sqlx(rename = "passwordResetToken")]
    #[serde(rename = "passwordResetToken", skip_serializing)]
    pub password_reset_token: Option<String>,
    #[sqlx(rename = "passwordResetExpires")]
    #[serde(rename = "passwordResetExpires", skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    #[sqlx(rename = "loginAttempts")]
    #[serde(rename = "loginAttempts")]
    pub login_attempts: i32,
    #[sqlx(rename = "lockUntil")]
    #[serde(rename = "lockUntil")]
    pub lock_until: Option<DateTime<Utc>>,
    #[sqlx(rename = "lastLogin")]
    #[serde(rename = "lastLogin")]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the account is locked at `now`. A lock whose window has
    /// passed counts as unlocked; clearing the stale fields is the lockout
    /// machinery's job, not the reader's.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        match self.lock_until {
            Some(lock_until) => lock_until > now,
            None => false,
        }
    }

    /// Both members of a single-use token pair are present or both absent.
    pub fn has_pending_verification(&self) -> bool {
        self.email_verification_token.is_some() && self.email_verification_expires.is_some()
    }

    pub fn has_pending_reset(&self) -> bool {
        self.password_reset_token.is_some() && self.password_reset_expires.is_some()
    }
}

/// Draft for account creation. The verification token pair is issued at
/// registration time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub verification_token: String,
    pub verification_expires: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            is_email_verified: false,
            email_verification_token: None,
            email_verification_expires: None,
            password_reset_token: None,
            password_reset_expires: None,
            login_attempts: 0,
            lock_until: None,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = sample_user();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn single_use_tokens_are_never_serialized() {
        let mut user = sample_user();
        user.password_reset_token = Some("deadbeef".to_string());
        user.password_reset_expires = Some(Utc::now());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordResetToken").is_none());
        assert!(json.get("emailVerificationToken").is_none());
    }

    #[test]
    fn lock_in_the_past_counts_as_unlocked() {
        let mut user = sample_user();
        let now = Utc::now();
        user.lock_until = Some(now - chrono::Duration::seconds(1));
        assert!(!user.is_locked(now));

        user.lock_until = Some(now + chrono::Duration::minutes(15));
        assert!(user.is_locked(now));
    }
}
