use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;

use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 50;
const SPECIALS: &[char] = &['@', '$', '!', '%', '*', '?', '&'];

pub const PASSWORD_POLICY_MESSAGE: &str = "Password must contain at least one uppercase letter, one lowercase letter, one number and one special character";

/// Letters, digits and `@$!%*?&` only, with at least one of each class.
pub fn validate_password_strength(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(AppError::bad_request(format!(
            "Password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
        )));
    }

    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(&c));
    let lower = password.chars().any(|c| c.is_ascii_lowercase());
    let upper = password.chars().any(|c| c.is_ascii_uppercase());
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let special = password.chars().any(|c| SPECIALS.contains(&c));

    if allowed && lower && upper && digit && special {
        Ok(())
    } else {
        Err(AppError::bad_request(PASSWORD_POLICY_MESSAGE))
    }
}

pub fn ensure_passwords_match(password: &str, confirm: &str) -> Result<(), AppError> {
    if password != confirm {
        return Err(AppError::bad_request("Passwords do not match"));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AppError::internal_with_source("password hashing failed", err))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| AppError::internal_with_source("stored password hash is invalid", err))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
