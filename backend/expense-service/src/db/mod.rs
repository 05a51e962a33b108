//! Storage adapters.
//!
//! The auth core and the resolver layer consume storage through the two
//! narrow traits below; `PgStore` is the Postgres implementation. Conflicting
//! writes serialize at the storage layer, not in application code: single-use
//! token consumption and the lockout counter increment are each a single SQL
//! statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Category, Expense, NewCategory, NewExpense, NewUser, User};

mod record_repo;
mod user_repo;

/// Account repository consumed by the auth service and the owner resolver.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up by case-normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Persist a new account. Fails `AccountExists` when the email is taken.
    async fn create(&self, draft: NewUser) -> Result<User>;

    async fn set_verification_token(
        &self,
        id: Uuid,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<()>;

    /// Atomically consume an unexpired verification token: set the verified
    /// flag and clear the token pair in one update. Returns the updated
    /// account, or None when no unexpired token matched.
    async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;

    async fn set_reset_token(&self, id: Uuid, token: &str, expires: DateTime<Utc>) -> Result<()>;

    /// Atomically consume an unexpired reset token: install the new password
    /// hash, clear the token pair and the lockout state in one update.
    async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;

    /// Storage-level atomic increment of `loginAttempts`; returns the
    /// post-increment value. The increment that crosses the lock threshold
    /// must never be lost under concurrent attempts.
    async fn increment_login_attempts(&self, id: Uuid) -> Result<i32>;

    async fn lock_account(&self, id: Uuid, until: DateTime<Utc>) -> Result<()>;

    /// Reset `loginAttempts` to 0 and clear `lockUntil`.
    async fn clear_lockout(&self, id: Uuid) -> Result<()>;

    /// Stamp `lastLogin`. Lost updates here are tolerable.
    async fn record_login(&self, id: Uuid) -> Result<()>;
}

/// Expense/category repository consumed by the resolver layer.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn expense_by_id(&self, id: Uuid) -> Result<Option<Expense>>;

    async fn expenses_by_creator(&self, creator_id: Uuid) -> Result<Vec<Expense>>;

    async fn expenses_by_category(&self, category_id: Uuid) -> Result<Vec<Expense>>;

    async fn create_expense(&self, draft: NewExpense) -> Result<Expense>;

    async fn category_by_id(&self, id: Uuid) -> Result<Option<Category>>;

    async fn categories_by_owner(&self, owner_id: Uuid) -> Result<Vec<Category>>;

    async fn find_category(&self, owner_id: Uuid, name: &str) -> Result<Option<Category>>;

    /// Persist a new category. Names are unique per owner; violations fail
    /// `CategoryExists`.
    async fn create_category(&self, draft: NewCategory) -> Result<Category>;
}

/// Postgres-backed implementation of both stores.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}
