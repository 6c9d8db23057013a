//! Argon2id password hashing and password policy checks.
//!
//! Hashes use the PHC string format so algorithm parameters and salt travel
//! with the hash. Verification is delegated to `argon2`, which compares in
//! constant time.

use anyhow::{anyhow, Result};
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use super::state::PasswordPolicy;

/// Hash a plaintext password with Argon2id and a fresh random salt.
///
/// # Errors
/// Returns an error if hashing fails.
pub(super) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; an `Err` means the stored hash itself is
/// unusable.
///
/// # Errors
/// Returns an error if the stored hash cannot be parsed.
pub(super) fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| anyhow!("invalid stored password hash: {err}"))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow!("failed to verify password: {err}")),
    }
}

/// Check a new password against the configured policy.
///
/// Returns a human-readable reason when the password is rejected.
pub(super) fn validate_password(password: &str, policy: PasswordPolicy) -> Result<(), String> {
    if password.chars().count() < policy.min_length() {
        return Err(format!(
            "Password must be at least {} characters long",
            policy.min_length()
        ));
    }
    if policy.require_mixed_case()
        && !(password.chars().any(char::is_uppercase) && password.chars().any(char::is_lowercase))
    {
        return Err("Password must contain both upper and lower case letters".to_string());
    }
    if policy.require_digit() && !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }
    Ok(())
}
