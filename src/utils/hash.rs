use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, SaltString, rand_core::OsRng},
};
use crate::error::AppError;

/// Generates a fresh random salt in its PHC base64 form.
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).as_str().to_owned()
}

/// Hashes `password` with the given salt.
///
/// Deterministic for a fixed (password, salt) pair; the result is a PHC string
/// that never contains the cleartext.
pub fn hash_password(password: &str, salt: &str) -> Result<String, AppError> {
    let salt = SaltString::from_b64(salt)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Re-hashes `password` with the stored salt and compares it with the stored hash.
///
/// The comparison is on the raw Argon2 outputs, whose equality is constant-time.
pub fn verify_password(password: &str, salt: &str, password_hash: &str) -> Result<bool, AppError> {
    let stored = PasswordHash::new(password_hash)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let candidate = hash_password(password, salt)?;
    let candidate = PasswordHash::new(&candidate)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    match (stored.hash, candidate.hash) {
        (Some(stored), Some(candidate)) => Ok(stored == candidate),
        _ => Ok(false),
    }
}
