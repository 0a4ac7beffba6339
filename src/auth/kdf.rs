//! Credential-key derivation.
//!
//! One Argon2id pass over the password, salted with a digest of the email,
//! yields 64 bytes that are split into two independent keys: a lookup key
//! used as the index of the encrypted wallet secret, and the AES key that
//! encrypts it. No salt needs to be stored; the `(email, password)` pair
//! always reproduces the same output.

use argon2::{Algorithm, Argon2, Params, Version};
use sha2::{Digest, Sha256};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Both halves of one Argon2id derivation.
pub struct DerivedKeys {
    /// Hex-encoded, non-reversible; safe to persist and index on.
    pub lookup_key: String,
    /// Transient AES-256 key; never persisted.
    pub encryption_key: [u8; 32],
}

/// Derive the lookup and encryption keys for an `(email, password)` pair.
///
/// Deterministic for any valid UTF-8 input; the only failure mode is a
/// misconfigured cost parameter, surfaced as `Internal`.
pub fn derive_keys(
    email: &str,
    password: &str,
    config: &AuthConfig,
) -> Result<DerivedKeys, AuthError> {
    let params = Params::new(
        config.kdf_memory_kib,
        config.kdf_iterations,
        config.kdf_parallelism,
        Some(64),
    )
    .map_err(|e| AuthError::Internal(format!("bad KDF params: {}", e)))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    // The email acts as salt material, hashed to a fixed width first.
    let salt = Sha256::digest(email.as_bytes());

    let mut output = [0u8; 64];
    argon2
        .hash_password_into(password.as_bytes(), &salt, &mut output)
        .map_err(|e| AuthError::Internal(format!("key derivation failed: {}", e)))?;

    let mut encryption_key = [0u8; 32];
    encryption_key.copy_from_slice(&output[32..]);

    Ok(DerivedKeys {
        lookup_key: hex::encode(&output[..32]),
        encryption_key,
    })
}

#[cfg(test)]
pub(crate) fn test_config() -> AuthConfig {
    // Small costs so tests stay fast; production values come from config.
    AuthConfig {
        kdf_memory_kib: 1024,
        kdf_iterations: 1,
        kdf_parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let config = test_config();
        let a = derive_keys("rider@example.com", "Passw0rd!", &config).unwrap();
        let b = derive_keys("rider@example.com", "Passw0rd!", &config).unwrap();
        assert_eq!(a.lookup_key, b.lookup_key);
        assert_eq!(a.encryption_key, b.encryption_key);
    }

    #[test]
    fn test_password_changes_both_keys() {
        let config = test_config();
        let a = derive_keys("rider@example.com", "Passw0rd!", &config).unwrap();
        let b = derive_keys("rider@example.com", "Passw0rd?", &config).unwrap();
        assert_ne!(a.lookup_key, b.lookup_key);
        assert_ne!(a.encryption_key, b.encryption_key);
    }

    #[test]
    fn test_email_changes_both_keys() {
        let config = test_config();
        let a = derive_keys("rider@example.com", "Passw0rd!", &config).unwrap();
        let b = derive_keys("other@example.com", "Passw0rd!", &config).unwrap();
        assert_ne!(a.lookup_key, b.lookup_key);
        assert_ne!(a.encryption_key, b.encryption_key);
    }

    #[test]
    fn test_lookup_key_is_hex() {
        let config = test_config();
        let keys = derive_keys("rider@example.com", "Passw0rd!", &config).unwrap();
        assert_eq!(keys.lookup_key.len(), 64);
        assert!(keys.lookup_key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
