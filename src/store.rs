//! RocksDB-backed persistence for users and encrypted wallet secrets.
//!
//! Key scheme:
//!   `user:<email>`        -> [`UserRecord`]
//!   `username:<username>` -> email (uniqueness index)
//!   `secret:<lookup_key>` -> [`SecretRecord`]
//!
//! The secret table is intentionally unlinked from the user table: a secret
//! is located by its password-derived lookup key alone, so the table never
//! reveals which email an encrypted blob belongs to.

use rocksdb::{Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

use crate::error::AuthError;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserRecord {
    pub email: String,
    pub username: String,
    pub wallet_address: String,
    pub session_verification_hash: String,
    pub created_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SecretRecord {
    pub iv: String,
    pub cipher_text: String,
    pub lookup_key: String,
}

pub struct Store {
    db: DB,
    // Serializes the uniqueness check + insert of signup so two racing
    // signups on the same email/username cannot both pass the check.
    write_lock: Mutex<()>,
}

impl Store {
    pub fn open(path: &str) -> Result<Self, AuthError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, Path::new(path))
            .map_err(|e| AuthError::Internal(format!("failed to open database: {}", e)))?;
        Ok(Store {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn put_batch<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        key: &str,
        value: &T,
    ) -> Result<(), AuthError> {
        let serialized = bincode::serialize(value)
            .map_err(|e| AuthError::Internal(format!("serialization failed: {}", e)))?;
        batch.put(key.as_bytes(), serialized);
        Ok(())
    }

    fn get<T: for<'a> Deserialize<'a>>(&self, key: &str) -> Result<Option<T>, AuthError> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(data)) => bincode::deserialize(&data)
                .map(Some)
                .map_err(|e| AuthError::Internal(format!("deserialization failed: {}", e))),
            Ok(None) => Ok(None),
            Err(e) => Err(AuthError::Internal(format!("database read failed: {}", e))),
        }
    }

    /// Insert a user and their encrypted wallet secret atomically.
    ///
    /// Both rows land in one write batch: a user without a secret (or the
    /// reverse) is unrepresentable. Fails with the field-specific duplicate
    /// error when email or username is taken.
    pub fn create_user(&self, user: &UserRecord, secret: &SecretRecord) -> Result<(), AuthError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AuthError::Internal("store lock poisoned".to_string()))?;

        if self.get::<UserRecord>(&format!("user:{}", user.email))?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }
        if self
            .get::<String>(&format!("username:{}", user.username))?
            .is_some()
        {
            return Err(AuthError::DuplicateUsername);
        }

        let mut batch = WriteBatch::default();
        self.put_batch(&mut batch, &format!("user:{}", user.email), user)?;
        self.put_batch(&mut batch, &format!("username:{}", user.username), &user.email)?;
        self.put_batch(&mut batch, &format!("secret:{}", secret.lookup_key), secret)?;

        self.db
            .write(batch)
            .map_err(|e| AuthError::Internal(format!("database write failed: {}", e)))
    }

    pub fn get_user(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        self.get(&format!("user:{}", email))
    }

    pub fn get_secret(&self, lookup_key: &str) -> Result<Option<SecretRecord>, AuthError> {
        self.get(&format!("secret:{}", lookup_key))
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::TempStore;
    use super::*;

    fn sample_user(email: &str, username: &str) -> UserRecord {
        UserRecord {
            email: email.to_string(),
            username: username.to_string(),
            wallet_address: "0x00".to_string(),
            session_verification_hash: "$argon2id$stub".to_string(),
            created_at: 0,
        }
    }

    fn sample_secret(lookup_key: &str) -> SecretRecord {
        SecretRecord {
            iv: "00".repeat(12),
            cipher_text: "ff".repeat(32),
            lookup_key: lookup_key.to_string(),
        }
    }

    #[test]
    fn test_create_and_fetch() {
        let tmp = TempStore::new();
        let user = sample_user("rider@example.com", "rider01");
        let secret = sample_secret("abc123");

        tmp.store.create_user(&user, &secret).unwrap();

        let fetched = tmp.store.get_user("rider@example.com").unwrap().unwrap();
        assert_eq!(fetched.username, "rider01");

        let fetched = tmp.store.get_secret("abc123").unwrap().unwrap();
        assert_eq!(fetched.cipher_text, secret.cipher_text);

        assert!(tmp.store.get_user("nobody@example.com").unwrap().is_none());
        assert!(tmp.store.get_secret("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let tmp = TempStore::new();
        tmp.store
            .create_user(&sample_user("rider@example.com", "rider01"), &sample_secret("k1"))
            .unwrap();

        let err = tmp
            .store
            .create_user(&sample_user("rider@example.com", "rider02"), &sample_secret("k2"))
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let tmp = TempStore::new();
        tmp.store
            .create_user(&sample_user("rider@example.com", "rider01"), &sample_secret("k1"))
            .unwrap();

        let err = tmp
            .store
            .create_user(&sample_user("other@example.com", "rider01"), &sample_secret("k2"))
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
    }

    #[test]
    fn test_racing_signups_one_winner() {
        let tmp = TempStore::new();
        let store_a = tmp.store.clone();
        let store_b = tmp.store.clone();

        let a = std::thread::spawn(move || {
            store_a.create_user(&sample_user("a@example.com", "rider01"), &sample_secret("ka"))
        });
        let b = std::thread::spawn(move || {
            store_b.create_user(&sample_user("b@example.com", "rider01"), &sample_secret("kb"))
        });

        let results = [a.join().unwrap(), b.join().unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AuthError::DuplicateUsername))));
    }
}
