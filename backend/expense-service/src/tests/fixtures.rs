/// Test fixtures and helpers for service-level tests.
///
/// `MemoryStore` is an in-memory double for both store traits. Each method
/// holds the collection lock for its whole body, which mirrors the atomicity
/// of the single-statement SQL queries in the Postgres implementation.
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{CredentialStore, RecordStore};
use crate::error::{ApiError, Result};
use crate::models::{Category, Expense, NewCategory, NewExpense, NewUser, User};
use crate::security::lockout::LockoutPolicy;
use crate::security::token::SessionTokenCodec;
use crate::services::auth::AuthService;
use crate::services::email::EmailService;

pub const TEST_EMAIL: &str = "a@x.com";
pub const TEST_PASSWORD: &str = "Secret123";
pub const TEST_NAME: &str = "A";

pub const TEST_SECRET: &str = "test-secret";

/// Low bcrypt cost keeps the tests fast; production cost comes from Config.
pub const TEST_BCRYPT_COST: u32 = 4;

pub fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 8080,
        database_url: "postgres://unused".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        session_ttl_hours: 24,
        single_use_token_ttl_minutes: 60,
        bcrypt_cost: TEST_BCRYPT_COST,
        max_login_attempts: 5,
        lock_duration_minutes: 15,
        smtp_host: String::new(),
        smtp_port: 587,
        smtp_username: None,
        smtp_password: None,
        smtp_from: "Expense Tracker <no-reply@expense-tracker.local>".to_string(),
        client_url: "http://localhost:3000".to_string(),
    }
}

pub fn session_codec() -> SessionTokenCodec {
    SessionTokenCodec::new(TEST_SECRET, Duration::hours(24))
}

/// Mailer in no-op mode (empty SMTP host).
pub fn no_op_mailer() -> EmailService {
    EmailService::new(&test_config()).unwrap()
}

pub fn auth_service(store: Arc<MemoryStore>) -> AuthService {
    AuthService::new(
        store,
        session_codec(),
        LockoutPolicy::default(),
        no_op_mailer(),
        TEST_BCRYPT_COST,
        Duration::hours(1),
    )
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<User>>,
    categories: Mutex<Vec<Category>>,
    expenses: Mutex<Vec<Expense>>,
}

impl MemoryStore {
    /// Current state of a stored user.
    pub fn user_snapshot(&self, id: Uuid) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    /// Mutate a stored user directly, bypassing the store API. Used to set
    /// up states that are awkward to reach through it (a lapsed lock, an
    /// expired token).
    pub fn update_user(&self, id: Uuid, f: impl FnOnce(&mut User)) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            f(user);
        }
    }

    /// Seed an account without going through registration. The placeholder
    /// password hash means the account cannot log in.
    pub fn seed_user(&self, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Seeded".to_string(),
            password_hash: "unusable".to_string(),
            is_email_verified: false,
            email_verification_token: None,
            email_verification_expires: None,
            password_reset_token: None,
            password_reset_expires: None,
            login_attempts: 0,
            lock_until: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn seed_category(&self, owner_id: Uuid, name: &str) -> Category {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        self.categories.lock().unwrap().push(category.clone());
        category
    }

    pub fn seed_expense(&self, creator_id: Uuid, category_id: Uuid, title: &str) -> Expense {
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            amount: 9.99,
            date: now,
            category_id,
            creator_id,
            created_at: now,
            updated_at: now,
        };
        self.expenses.lock().unwrap().push(expense.clone());
        expense
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.user_snapshot(id))
    }

    async fn create(&self, draft: NewUser) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == draft.email) {
            return Err(ApiError::AccountExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: draft.email,
            name: draft.name,
            password_hash: draft.password_hash,
            is_email_verified: false,
            email_verification_token: Some(draft.verification_token),
            email_verification_expires: Some(draft.verification_expires),
            password_reset_token: None,
            password_reset_expires: None,
            login_attempts: 0,
            lock_until: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_verification_token(
        &self,
        id: Uuid,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<()> {
        self.update_user(id, |u| {
            u.email_verification_token = Some(token.to_string());
            u.email_verification_expires = Some(expires);
        });
        Ok(())
    }

    async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| {
            u.email_verification_token.as_deref() == Some(token)
                && u.email_verification_expires.map_or(false, |exp| exp > now)
        });

        Ok(user.map(|u| {
            u.is_email_verified = true;
            u.email_verification_token = None;
            u.email_verification_expires = None;
            u.clone()
        }))
    }

    async fn set_reset_token(&self, id: Uuid, token: &str, expires: DateTime<Utc>) -> Result<()> {
        self.update_user(id, |u| {
            u.password_reset_token = Some(token.to_string());
            u.password_reset_expires = Some(expires);
        });
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| {
            u.password_reset_token.as_deref() == Some(token)
                && u.password_reset_expires.map_or(false, |exp| exp > now)
        });

        Ok(user.map(|u| {
            u.password_hash = new_password_hash.to_string();
            u.password_reset_token = None;
            u.password_reset_expires = None;
            u.login_attempts = 0;
            u.lock_until = None;
            u.clone()
        }))
    }

    async fn increment_login_attempts(&self, id: Uuid) -> Result<i32> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(ApiError::NotFound)?;
        user.login_attempts += 1;
        Ok(user.login_attempts)
    }

    async fn lock_account(&self, id: Uuid, until: DateTime<Utc>) -> Result<()> {
        self.update_user(id, |u| u.lock_until = Some(until));
        Ok(())
    }

    async fn clear_lockout(&self, id: Uuid) -> Result<()> {
        self.update_user(id, |u| {
            u.login_attempts = 0;
            u.lock_until = None;
        });
        Ok(())
    }

    async fn record_login(&self, id: Uuid) -> Result<()> {
        self.update_user(id, |u| u.last_login = Some(Utc::now()));
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn expense_by_id(&self, id: Uuid) -> Result<Option<Expense>> {
        Ok(self
            .expenses
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn expenses_by_creator(&self, creator_id: Uuid) -> Result<Vec<Expense>> {
        Ok(self
            .expenses
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn expenses_by_category(&self, category_id: Uuid) -> Result<Vec<Expense>> {
        Ok(self
            .expenses
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn create_expense(&self, draft: NewExpense) -> Result<Expense> {
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            amount: draft.amount,
            date: draft.date,
            category_id: draft.category_id,
            creator_id: draft.creator_id,
            created_at: now,
            updated_at: now,
        };
        self.expenses.lock().unwrap().push(expense.clone());
        Ok(expense)
    }

    async fn category_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn categories_by_owner(&self, owner_id: Uuid) -> Result<Vec<Category>> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find_category(&self, owner_id: Uuid, name: &str) -> Result<Option<Category>> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.owner_id == owner_id && c.name == name)
            .cloned())
    }

    async fn create_category(&self, draft: NewCategory) -> Result<Category> {
        let mut categories = self.categories.lock().unwrap();
        if categories
            .iter()
            .any(|c| c.owner_id == draft.owner_id && c.name == draft.name)
        {
            return Err(ApiError::CategoryExists);
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            owner_id: draft.owner_id,
            created_at: now,
            updated_at: now,
        };
        categories.push(category.clone());
        Ok(category)
    }
}
