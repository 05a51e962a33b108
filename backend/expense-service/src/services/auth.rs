//! Authentication service.
//!
//! The only component that touches the token codec, the lockout machinery and
//! the credential store together. Every operation validates before any
//! persistent write and never leaves a consumed single-use token behind: the
//! token fields are cleared in the same update as the effect they gate.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::db::CredentialStore;
use crate::error::{ApiError, Result};
use crate::middleware::identity::IdentityContext;
use crate::models::{NewUser, User};
use crate::security::lockout::{evaluate, LockState, LockoutPolicy};
use crate::security::token::{generate_single_use_token, single_use_expiry, SessionTokenCodec};
use crate::security::{hash_password, verify_password};
use crate::services::email::EmailService;

/// Fixed acknowledgement for password reset requests. Identical whether or
/// not the email exists, so the endpoint cannot be used to enumerate
/// accounts.
pub const RESET_REQUEST_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// A successful authentication: the bearer token plus the account it binds.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: SessionTokenCodec,
    lockout: LockoutPolicy,
    mailer: EmailService,
    bcrypt_cost: u32,
    single_use_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: SessionTokenCodec,
        lockout: LockoutPolicy,
        mailer: EmailService,
        bcrypt_cost: u32,
        single_use_ttl: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            lockout,
            mailer,
            bcrypt_cost,
            single_use_ttl,
        }
    }

    /// The session token codec, shared with the identity middleware.
    pub fn token_codec(&self) -> &SessionTokenCodec {
        &self.tokens
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthSession> {
        let email = Self::normalize_email(email);
        if !email.validate_email() {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation(
                "Display name must not be empty".to_string(),
            ));
        }

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(ApiError::AccountExists);
        }

        let password_hash = hash_password(password, self.bcrypt_cost)?;

        let verification_token = generate_single_use_token();
        let verification_expires = single_use_expiry(Utc::now(), self.single_use_ttl);

        // The unique index on email catches the race between the existence
        // check above and this insert.
        let user = self
            .store
            .create(NewUser {
                email,
                name: name.to_string(),
                password_hash,
                verification_token: verification_token.clone(),
                verification_expires,
            })
            .await?;

        // Best-effort notification: a failed send is reported but does not
        // roll back registration.
        if let Err(err) = self
            .mailer
            .send_verification_email(&user.email, &user.name, &verification_token)
            .await
        {
            warn!(user_id = %user.id, error = %err, "failed to send verification email");
        }

        let (token, expires_at) = self.tokens.issue(user.id)?;

        info!(user_id = %user.id, "user registered");

        Ok(AuthSession {
            token,
            expires_at,
            user,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = Self::normalize_email(email);

        let Some(user) = self.store.find_by_email(&email).await? else {
            return Err(ApiError::InvalidCredentials);
        };

        let now = Utc::now();
        match evaluate(user.lock_until, now) {
            LockState::Locked(until) => {
                warn!(user_id = %user.id, locked_until = %until, "login attempt on locked account");
                return Err(ApiError::AccountLocked);
            }
            LockState::Lapsed => {
                // The lock window has passed: clear the stale fields so the
                // triggering attempt restarts the counter (a mismatch below
                // leaves it at 1).
                self.store.clear_lockout(user.id).await?;
            }
            LockState::Open => {}
        }

        if !verify_password(password, &user.password_hash)? {
            let attempts = self.store.increment_login_attempts(user.id).await?;
            if self.lockout.should_lock(attempts) {
                self.store
                    .lock_account(user.id, self.lockout.lock_until(now))
                    .await?;
                warn!(user_id = %user.id, attempts, "account locked after repeated failures");
            }
            return Err(ApiError::InvalidCredentials);
        }

        self.store.clear_lockout(user.id).await?;
        self.store.record_login(user.id).await?;

        let (token, expires_at) = self.tokens.issue(user.id)?;

        info!(user_id = %user.id, "user logged in");

        Ok(AuthSession {
            token,
            expires_at,
            user,
        })
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<&'static str> {
        let email = Self::normalize_email(email);

        if let Some(user) = self.store.find_by_email(&email).await? {
            let reset_token = generate_single_use_token();
            let expires = single_use_expiry(Utc::now(), self.single_use_ttl);
            self.store
                .set_reset_token(user.id, &reset_token, expires)
                .await?;

            if let Err(err) = self
                .mailer
                .send_password_reset_email(&user.email, &user.name, &reset_token)
                .await
            {
                warn!(user_id = %user.id, error = %err, "failed to send password reset email");
            }

            info!(user_id = %user.id, "password reset requested");
        }

        Ok(RESET_REQUEST_MESSAGE)
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<&'static str> {
        // Hashing first keeps the consume atomic: a weak password fails here
        // with the token still intact.
        let password_hash = hash_password(new_password, self.bcrypt_cost)?;

        let user = self
            .store
            .consume_reset_token(token, &password_hash, Utc::now())
            .await?
            .ok_or(ApiError::InvalidOrExpiredToken)?;

        info!(user_id = %user.id, "password reset completed");

        Ok("Password has been reset. You can now log in with your new password.")
    }

    pub async fn verify_email(&self, token: &str) -> Result<&'static str> {
        let user = self
            .store
            .consume_verification_token(token, Utc::now())
            .await?
            .ok_or(ApiError::InvalidOrExpiredToken)?;

        info!(user_id = %user.id, "email verified");

        Ok("Email verified successfully.")
    }

    pub async fn resend_verification_email(
        &self,
        identity: &IdentityContext,
    ) -> Result<&'static str> {
        let subject = identity.require_subject()?;
        let user = self.subject_account(subject).await?;

        if user.is_email_verified {
            return Err(ApiError::AlreadyVerified);
        }

        let verification_token = generate_single_use_token();
        let expires = single_use_expiry(Utc::now(), self.single_use_ttl);
        self.store
            .set_verification_token(user.id, &verification_token, expires)
            .await?;

        if let Err(err) = self
            .mailer
            .send_verification_email(&user.email, &user.name, &verification_token)
            .await
        {
            warn!(user_id = %user.id, error = %err, "failed to send verification email");
        }

        info!(user_id = %user.id, "verification email reissued");

        Ok("Verification email sent.")
    }

    async fn subject_account(&self, subject: Uuid) -> Result<User> {
        self.store
            .find_by_id(subject)
            .await?
            .ok_or(ApiError::NotFound)
    }
}
