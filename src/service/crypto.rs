use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;

use crate::errors::ApiError;

/// Argon2id PHC-string hash with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ApiError::ServerError)
}

/// Constant-time verification against a stored PHC string. A hash that
/// does not parse is treated as a mismatch, not a server error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Invitation token: 16 random bytes rendered as 32 hex chars. The
/// unique index on `review_links.token` is the real collision guard.
pub fn generate_link_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// 6-digit password-reset code.
pub fn generate_reset_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}
