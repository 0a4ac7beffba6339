//! Wallet-secret creation and recovery.
//!
//! The entropy string is encrypted under the password-derived key with
//! AES-256-GCM. The GCM tag doubles as the wrong-password check: a key
//! derived from the wrong password fails authentication instead of
//! producing garbage entropy.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use super::kdf::DerivedKeys;
use crate::error::AuthError;
use crate::wallet::{Wallet, ENTROPY_BYTES};

const IV_BYTES: usize = 12;

/// Everything produced on the signup path for one fresh wallet secret.
pub struct SecretBundle {
    pub iv: String,
    pub cipher_text: String,
    pub entropy: String,
    pub wallet: Wallet,
}

/// Generate a fresh entropy value from the system RNG.
///
/// Hex encoding matters beyond readability: the session token is split on
/// `.`, and the hex alphabet guarantees entropy can never contain one.
pub fn generate_entropy() -> Result<String, AuthError> {
    let mut bytes = [0u8; ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Internal(format!("RNG failure: {}", e)))?;
    Ok(hex::encode(bytes))
}

/// Signup path: fresh entropy, encrypted under the derived key, plus the
/// wallet it deterministically maps to.
pub fn create_secret(keys: &DerivedKeys) -> Result<SecretBundle, AuthError> {
    let entropy = generate_entropy()?;
    let (iv, cipher_text) = encrypt_entropy(keys, &entropy)?;
    let wallet = Wallet::from_entropy(&entropy)?;

    Ok(SecretBundle {
        iv,
        cipher_text,
        entropy,
        wallet,
    })
}

pub fn encrypt_entropy(
    keys: &DerivedKeys,
    entropy: &str,
) -> Result<(String, String), AuthError> {
    let cipher = Aes256Gcm::new_from_slice(&keys.encryption_key)
        .map_err(|_| AuthError::Internal("invalid encryption key length".to_string()))?;

    let mut iv_bytes = [0u8; IV_BYTES];
    OsRng
        .try_fill_bytes(&mut iv_bytes)
        .map_err(|e| AuthError::Internal(format!("RNG failure: {}", e)))?;
    let nonce = Nonce::from_slice(&iv_bytes);

    let cipher_text = cipher
        .encrypt(nonce, entropy.as_bytes())
        .map_err(|_| AuthError::Internal("encryption failed".to_string()))?;

    Ok((hex::encode(iv_bytes), hex::encode(cipher_text)))
}

/// Login path: recover the entropy, or fail generically.
///
/// Malformed hex, a bad IV length and a GCM tag mismatch all collapse into
/// `InvalidCredential`; distinguishing them would let a caller probe which
/// part of a stored record it guessed right.
pub fn decrypt_secret(
    keys: &DerivedKeys,
    iv: &str,
    cipher_text: &str,
) -> Result<String, AuthError> {
    let iv_bytes = hex::decode(iv).map_err(|_| AuthError::InvalidCredential)?;
    if iv_bytes.len() != IV_BYTES {
        return Err(AuthError::InvalidCredential);
    }
    let cipher_bytes = hex::decode(cipher_text).map_err(|_| AuthError::InvalidCredential)?;

    let cipher = Aes256Gcm::new_from_slice(&keys.encryption_key)
        .map_err(|_| AuthError::Internal("invalid encryption key length".to_string()))?;

    let plain = cipher
        .decrypt(Nonce::from_slice(&iv_bytes), cipher_bytes.as_slice())
        .map_err(|_| AuthError::InvalidCredential)?;

    String::from_utf8(plain).map_err(|_| AuthError::InvalidCredential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::kdf::{derive_keys, test_config};

    fn keys(email: &str, password: &str) -> DerivedKeys {
        derive_keys(email, password, &test_config()).unwrap()
    }

    #[test]
    fn test_entropy_alphabet() {
        let entropy = generate_entropy().unwrap();
        assert_eq!(entropy.len(), ENTROPY_BYTES * 2);
        assert!(entropy.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!entropy.contains('.'));
    }

    #[test]
    fn test_round_trip() {
        let keys = keys("rider@example.com", "Passw0rd!");
        let bundle = create_secret(&keys).unwrap();
        let recovered = decrypt_secret(&keys, &bundle.iv, &bundle.cipher_text).unwrap();
        assert_eq!(recovered, bundle.entropy);
    }

    #[test]
    fn test_wrong_password_fails_decryption() {
        let right = keys("rider@example.com", "Passw0rd!");
        let wrong = keys("rider@example.com", "Passw0rd?");
        let bundle = create_secret(&right).unwrap();

        let err = decrypt_secret(&wrong, &bundle.iv, &bundle.cipher_text).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[test]
    fn test_tampered_cipher_text_fails() {
        let keys = keys("rider@example.com", "Passw0rd!");
        let bundle = create_secret(&keys).unwrap();

        // Flip one bit of the first ciphertext byte.
        let mut raw = hex::decode(&bundle.cipher_text).unwrap();
        raw[0] ^= 0x01;
        let tampered = hex::encode(raw);

        let err = decrypt_secret(&keys, &bundle.iv, &tampered).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[test]
    fn test_wallet_matches_entropy() {
        let keys = keys("rider@example.com", "Passw0rd!");
        let bundle = create_secret(&keys).unwrap();
        let rederived = Wallet::from_entropy(&bundle.entropy).unwrap();
        assert_eq!(bundle.wallet.address(), rederived.address());
    }
}
