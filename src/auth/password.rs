//! Credential rules and `Argon2id` hashing for email/password accounts.

use std::ops::RangeInclusive;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

const PASSWORD_CHARS: RangeInclusive<usize> = 6..=128;
const USERNAME_CHARS: RangeInclusive<usize> = 3..=50;

/// Hash a password into a PHC string with a fresh random salt.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))
}

/// Check `password` against a stored PHC string.
///
/// # Errors
///
/// Returns an error only when the stored hash cannot be parsed; a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("stored password hash is malformed: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// # Errors
///
/// Message for a 400 response when the length is outside 6..=128 characters.
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < *PASSWORD_CHARS.start() {
        Err(format!(
            "Password must be at least {} characters.",
            PASSWORD_CHARS.start()
        ))
    } else if len > *PASSWORD_CHARS.end() {
        Err(format!(
            "Password must be at most {} characters.",
            PASSWORD_CHARS.end()
        ))
    } else {
        Ok(())
    }
}

/// Accepts `local@domain.tld`: one `@`, a non-empty local part, and a domain
/// with an inner dot.
///
/// # Errors
///
/// Message for a 400 response.
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required.".to_string());
    }
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
            && !domain.ends_with('.')
            && !email.contains(char::is_whitespace)
    });
    if valid {
        Ok(())
    } else {
        Err("Invalid email format.".to_string())
    }
}

/// Usernames are 3 to 50 ASCII letters, digits or underscores.
///
/// # Errors
///
/// Message for a 400 response.
pub fn validate_username(username: &str) -> Result<(), String> {
    if !USERNAME_CHARS.contains(&username.chars().count()) {
        return Err(format!(
            "Username must be between {} and {} characters.",
            USERNAME_CHARS.start(),
            USERNAME_CHARS.end()
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username may only contain letters, numbers, and underscores.".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap_or_default();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap_or_default());
        assert!(!verify_password("wrong horse", &hash).unwrap_or_default());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[test]
    fn test_validate_password_bounds() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"a".repeat(128)).is_ok());
        assert!(validate_password(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("  ").is_err());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("ada@example.").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ada_l").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("ada lovelace").is_err());
        assert!(validate_username("adé_l").is_err());
    }
}
