//! Session-verification hashing.
//!
//! The server never stores a session table. A user row carries an Argon2
//! hash of the entropy; a bearer token proves itself by hash-matching that
//! value. An attacker who read the database holds only the hash and cannot
//! forge a token, and the verify step is constant-time.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::error::AuthError;
use crate::store::UserRecord;

/// A validated session: the user row plus the proven entropy, which callers
/// may use to re-derive the wallet without another password prompt.
#[derive(Debug)]
pub struct SessionUser {
    pub user: UserRecord,
    pub entropy: String,
}

/// Hash the entropy for storage on the user record. Written once at signup;
/// rewritten only when the wallet secret itself is re-encrypted, which
/// force-expires every outstanding session for that user.
pub fn hash_entropy(entropy: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(entropy.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(format!("entropy hashing failed: {}", e)))
}

/// Constant-time check of a presented entropy against the stored hash.
pub fn verify_entropy(entropy: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(entropy.as_bytes(), &parsed)
        .is_ok()
}
