//! Deterministic wallet derivation from a stored entropy value.
//!
//! The entropy is the sole seed: it is expanded to a BIP39 mnemonic, then a
//! BIP32 child key at a fixed path, so the same entropy always lands on the
//! same keypair and address. Login depends on this to find the user's wallet
//! again without storing any key material server-side.

use bip39::{Language, Mnemonic};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use tiny_hderive::bip32::ExtendedPrivKey;

use crate::error::AuthError;

/// Fixed HD derivation path (Ethereum coin type, first account).
pub const DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Number of entropy bytes behind the hex string (128 bits, 12 words).
pub const ENTROPY_BYTES: usize = 16;

pub struct Wallet {
    address: String,
    signing_key: SigningKey,
}

impl Wallet {
    /// Derive the wallet for a hex-encoded entropy string.
    pub fn from_entropy(entropy: &str) -> Result<Self, AuthError> {
        let entropy_bytes = hex::decode(entropy)
            .map_err(|_| AuthError::Internal("entropy is not valid hex".to_string()))?;

        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy_bytes)
            .map_err(|e| AuthError::Internal(format!("invalid entropy length: {}", e)))?;
        let seed = mnemonic.to_seed("");

        let ext_key = ExtendedPrivKey::derive(&seed, DERIVATION_PATH)
            .map_err(|_| AuthError::Internal("key derivation failed".to_string()))?;

        let signing_key = SigningKey::from_bytes(&ext_key.secret());
        let address = derive_address(&signing_key.verifying_key());

        Ok(Self {
            address,
            signing_key,
        })
    }

    /// `0x`-prefixed address string, stored on the user record at signup.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign an arbitrary message (used for the transfer-permit flow).
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl std::fmt::Debug for Wallet {
    // Keep the signing key out of log output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Address = last 20 bytes of SHA-256 over the public key, hex encoded.
fn derive_address(key: &VerifyingKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("0x{}", hex::encode(&digest[digest.len() - 20..]))
}
