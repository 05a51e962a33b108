/// Password hashing and verification using bcrypt
use crate::error::{ApiError, Result};

/// Hash a password with the given bcrypt cost factor.
/// Returns the hash string suitable for storage in the database.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    // Validate password strength first
    validate_password_strength(password)?;

    bcrypt::hash(password, cost)
        .map_err(|_| ApiError::Internal("Failed to hash password".to_string()))
}

/// Verify a password against a stored hash. The comparison inside bcrypt is
/// constant-time.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|_| ApiError::Internal("Invalid password hash format".to_string()))
}

/// Validate password strength
/// Requirements:
/// - Minimum 8 characters
/// - At least one letter
/// - At least one digit
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_letter && has_digit {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Password must contain at least one letter and one digit".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the tests fast; production cost comes from Config.
    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_and_verify() {
        let password = "Secret123";
        let hash = hash_password(password, TEST_COST).unwrap();
        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_wrong_password() {
        let password = "Secret123";
        let hash = hash_password(password, TEST_COST).unwrap();
        assert!(!verify_password("Wrong456x", &hash).unwrap());
    }

    #[test]
    fn test_weak_password_too_short() {
        assert!(hash_password("Ab1", TEST_COST).is_err());
    }

    #[test]
    fn test_weak_password_no_digit() {
        assert!(hash_password("Secretpass", TEST_COST).is_err());
    }

    #[test]
    fn test_weak_password_no_letter() {
        assert!(hash_password("12345678", TEST_COST).is_err());
    }

    #[test]
    fn test_garbage_hash_is_an_internal_error() {
        let result = verify_password("Secret123", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }
}
