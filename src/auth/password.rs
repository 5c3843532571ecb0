//! Password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::Error;

/// Hash a raw password with Argon2id and a fresh random salt.
///
/// The returned PHC string embeds the salt and parameters, so verification
/// needs nothing beyond the stored hash.
pub fn hash_password(raw: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|e| Error::Internal {
            operation: format!("hash password: {e}"),
        })?;

    Ok(hash.to_string())
}

/// Verify a raw password against a stored PHC hash string.
///
/// Verification uses the parameters embedded in the hash itself.
pub fn verify_password(raw: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse stored hash: {e}"),
    })?;

    Ok(Argon2::default()
        .verify_password(raw.as_bytes(), &parsed_hash)
        .is_ok())
}
