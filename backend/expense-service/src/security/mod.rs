/// Security module for authentication
/// Provides password hashing, session token management, single-use tokens
/// and brute-force lockout tracking.
pub mod lockout;
pub mod password;
pub mod token;

pub use lockout::{LockState, LockoutPolicy};
pub use password::{hash_password, verify_password};
pub use token::{generate_single_use_token, single_use_expiry, SessionTokenCodec, TokenError};
