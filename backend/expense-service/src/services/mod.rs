pub mod auth;
pub mod email;

pub use auth::{AuthService, AuthSession};
pub use email::EmailService;
