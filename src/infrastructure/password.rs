//! Argon2id password hashing for the bundled identity providers

use crate::error::{AuthError, DaybookError, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Hash a plaintext password with a random salt, returning the PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DaybookError::Auth(AuthError::Other(format!("Failed to hash password: {}", e))))?;
    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| DaybookError::Auth(AuthError::Other(format!("Corrupt password hash: {}", e))))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DaybookError::Auth(AuthError::Other(e.to_string()))),
    }
}

/// Reject passwords the provider would refuse anyway
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(DaybookError::Auth(AuthError::Other(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ))));
    }
    Ok(())
}
