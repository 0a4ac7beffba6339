//! Authentication subsystem.
//!
//! Signup derives a credential key from the password, encrypts a fresh
//! wallet entropy under it and stores only the encrypted blob plus a one-way
//! hash of the entropy. Login re-derives the key, locates the blob by its
//! lookup key and decrypts the same entropy back. Sessions are stateless
//! bearer tokens carrying the entropy itself, validated against the stored
//! hash on every request.

pub mod kdf;
pub mod secret;
pub mod session;
pub mod token;

pub use kdf::{derive_keys, DerivedKeys};
pub use secret::{create_secret, decrypt_secret, generate_entropy, SecretBundle};
pub use session::SessionUser;
pub use token::SessionToken;

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::store::{SecretRecord, Store, UserRecord};

/// An authenticated session as returned by signup and login.
#[derive(Debug)]
pub struct AuthSession {
    pub entropy: String,
    pub session_token: String,
    pub user: UserRecord,
}

pub struct AuthService {
    store: Arc<Store>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(store: Arc<Store>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Register a new user: derive keys, create the encrypted wallet secret
    /// and insert user + secret atomically.
    ///
    /// Inputs are assumed validated; email and username are case-normalized
    /// here so every later lookup sees one canonical form.
    pub async fn signup(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = email.to_lowercase();
        let username = username.to_lowercase();

        // Friendly pre-check; the store re-checks under its write lock.
        if self.store.get_user(&email)?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        // The KDF and the entropy hash are CPU-bound; keep them off the
        // request-handling task.
        let config = self.config;
        let kdf_email = email.clone();
        let password = password.to_string();
        let (bundle, session_hash, lookup_key) = tokio::task::spawn_blocking(move || {
            let keys = kdf::derive_keys(&kdf_email, &password, &config)?;
            let bundle = secret::create_secret(&keys)?;
            let session_hash = session::hash_entropy(&bundle.entropy)?;
            Ok::<_, AuthError>((bundle, session_hash, keys.lookup_key))
        })
        .await
        .map_err(|e| AuthError::Internal(format!("KDF task failed: {}", e)))??;

        let user = UserRecord {
            email: email.clone(),
            username,
            wallet_address: bundle.wallet.address().to_string(),
            session_verification_hash: session_hash,
            created_at: chrono::Utc::now().timestamp(),
        };
        let record = SecretRecord {
            iv: bundle.iv,
            cipher_text: bundle.cipher_text,
            lookup_key,
        };

        self.store.create_user(&user, &record)?;
        tracing::info!(email = %user.email, "user registered");

        let session_token = SessionToken::new(&user.email, &bundle.entropy).encode()?;
        Ok(AuthSession {
            entropy: bundle.entropy,
            session_token,
            user,
        })
    }

    /// Authenticate with email + password.
    ///
    /// Every failure shape (no such secret, tag mismatch, missing user row)
    /// is the same `InvalidCredential`, so a caller cannot tell whether the
    /// email exists.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.to_lowercase();

        let config = self.config;
        let kdf_email = email.clone();
        let password = password.to_string();
        let keys = tokio::task::spawn_blocking(move || {
            kdf::derive_keys(&kdf_email, &password, &config)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("KDF task failed: {}", e)))??;

        let record = self
            .store
            .get_secret(&keys.lookup_key)?
            .ok_or(AuthError::InvalidCredential)?;

        // Symmetric decryption is cheap; no need to leave the task.
        let entropy = secret::decrypt_secret(&keys, &record.iv, &record.cipher_text)?;

        let user = self
            .store
            .get_user(&email)?
            .ok_or(AuthError::InvalidCredential)?;
        tracing::info!(email = %user.email, "login succeeded");

        let session_token = SessionToken::new(&user.email, &entropy).encode()?;
        Ok(AuthSession {
            entropy,
            session_token,
            user,
        })
    }

    /// Validate a bearer token and return the user it proves.
    ///
    /// Runs on every protected request. Stateless: no session table is
    /// consulted, only the verification hash on the user row.
    pub async fn validate(&self, raw_token: &str) -> Result<SessionUser, AuthError> {
        let token = SessionToken::decode(raw_token)?;

        let user = self
            .store
            .get_user(&token.email)?
            .ok_or(AuthError::Unauthenticated)?;

        // Argon2 verify is CPU-bound like the KDF.
        let entropy = token.entropy;
        let stored_hash = user.session_verification_hash.clone();
        let check_entropy = entropy.clone();
        let is_valid = tokio::task::spawn_blocking(move || {
            session::verify_entropy(&check_entropy, &stored_hash)
        })
        .await
        .map_err(|e| AuthError::Internal(format!("verify task failed: {}", e)))?;

        if !is_valid {
            tracing::warn!(email = %user.email, "session token rejected");
            return Err(AuthError::Unauthenticated);
        }

        Ok(SessionUser { user, entropy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_util::TempStore;

    fn service(tmp: &TempStore) -> AuthService {
        AuthService::new(tmp.store.clone(), kdf::test_config())
    }

    #[tokio::test]
    async fn test_signup_then_validate() {
        let tmp = TempStore::new();
        let auth = service(&tmp);

        let session = auth
            .signup("new@example.com", "rider01", "Passw0rd!")
            .await
            .unwrap();
        assert!(!session.entropy.is_empty());
        assert!(session.session_token.starts_with("new@example.com."));

        let validated = auth.validate(&session.session_token).await.unwrap();
        assert_eq!(validated.user.email, "new@example.com");
        assert_eq!(validated.user.username, "rider01");
        assert_eq!(validated.entropy, session.entropy);
    }

    #[tokio::test]
    async fn test_login_recovers_same_wallet() {
        let tmp = TempStore::new();
        let auth = service(&tmp);

        let signup = auth
            .signup("rider@example.com", "rider01", "Passw0rd!")
            .await
            .unwrap();
        let login = auth.login("rider@example.com", "Passw0rd!").await.unwrap();

        assert_eq!(login.entropy, signup.entropy);
        assert_eq!(login.user.wallet_address, signup.user.wallet_address);
        assert_eq!(login.session_token, signup.session_token);
    }

    #[tokio::test]
    async fn test_login_is_case_insensitive_on_email() {
        let tmp = TempStore::new();
        let auth = service(&tmp);

        auth.signup("Rider@Example.com", "rider01", "Passw0rd!")
            .await
            .unwrap();
        let session = auth.login("RIDER@example.COM", "Passw0rd!").await.unwrap();
        assert_eq!(session.user.email, "rider@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password_is_generic() {
        let tmp = TempStore::new();
        let auth = service(&tmp);

        auth.signup("rider@example.com", "rider01", "Passw0rd!")
            .await
            .unwrap();

        let wrong_password = auth
            .login("rider@example.com", "Wrong0ne!")
            .await
            .unwrap_err();
        let unknown_email = auth
            .login("ghost@example.com", "Passw0rd!")
            .await
            .unwrap_err();

        // Same error class either way: no account enumeration.
        assert!(matches!(wrong_password, AuthError::InvalidCredential));
        assert!(matches!(unknown_email, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_validate_rejections_are_uniform() {
        let tmp = TempStore::new();
        let auth = service(&tmp);

        let session = auth
            .signup("rider@example.com", "rider01", "Passw0rd!")
            .await
            .unwrap();

        // (a) token for a non-existent email
        let ghost = SessionToken::new("ghost@example.com", &session.entropy)
            .encode()
            .unwrap();
        // (b) entropy that does not hash-match
        let forged = SessionToken::new("rider@example.com", "ffffffffffffffffffffffffffffffff")
            .encode()
            .unwrap();
        // (c) no separator at all
        let malformed = "rider@example-com".to_string();

        for raw in [ghost, forged, malformed] {
            let err = auth.validate(&raw).await.unwrap_err();
            assert!(matches!(err, AuthError::Unauthenticated), "{}", raw);
        }
    }

    #[tokio::test]
    async fn test_racing_signups_same_username() {
        let tmp = TempStore::new();
        let auth = Arc::new(service(&tmp));

        let a = {
            let auth = auth.clone();
            tokio::spawn(
                async move { auth.signup("a@example.com", "rider01", "Passw0rd!").await },
            )
        };
        let b = {
            let auth = auth.clone();
            tokio::spawn(
                async move { auth.signup("b@example.com", "rider01", "Passw0rd!").await },
            )
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AuthError::DuplicateUsername))));
    }
}
