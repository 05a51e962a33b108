/// Configuration management
use chrono::Duration;
use serde::Deserialize;

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_single_use_token_ttl_minutes() -> i64 {
    60
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_max_login_attempts() -> i32 {
    5
}

fn default_lock_duration_minutes() -> i64 {
    15
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_from() -> String {
    "Expense Tracker <no-reply@expense-tracker.local>".to_string()
}

fn default_client_url() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_host")]
    pub server_host: String,
    #[serde(default = "default_server_port")]
    pub server_port: u16,

    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_single_use_token_ttl_minutes")]
    pub single_use_token_ttl_minutes: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: i32,
    #[serde(default = "default_lock_duration_minutes")]
    pub lock_duration_minutes: i64,

    // Empty SMTP host puts the mailer in no-op mode
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default = "default_smtp_from")]
    pub smtp_from: String,

    /// Base URL of the web client, used for links in outbound emails.
    #[serde(default = "default_client_url")]
    pub client_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }

    pub fn single_use_ttl(&self) -> Duration {
        Duration::minutes(self.single_use_token_ttl_minutes)
    }

    pub fn lock_duration(&self) -> Duration {
        Duration::minutes(self.lock_duration_minutes)
    }
}
