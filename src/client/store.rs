//! Client-side session-token storage.
//!
//! The token store is an injected object with an explicit lifecycle, not a
//! process-global: it is populated on first read, updated on login/signup
//! and invalidated on logout. The file-backed implementation stands in for
//! the platform keychain and caches in memory so steady-state requests
//! never touch the disk.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AuthError;

/// Fixed storage key, shared with the mobile/web clients.
pub const SESSION_KEY: &str = "uppernft.sid";

pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, AuthError>;
    fn save(&self, token: &str) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

pub struct FileTokenStore {
    path: PathBuf,
    // None = not read yet; Some(None) = known absent.
    cache: Mutex<Option<Option<String>>>,
}

impl FileTokenStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(SESSION_KEY),
            cache: Mutex::new(None),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Option<String>>>, AuthError> {
        self.cache
            .lock()
            .map_err(|_| AuthError::Internal("token cache poisoned".to_string()))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, AuthError> {
        let mut cache = self.lock()?;
        if let Some(cached) = cache.as_ref() {
            return Ok(cached.clone());
        }

        let token = match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim().to_string();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(AuthError::Internal(format!("token read failed: {}", e))),
        };
        *cache = Some(token.clone());
        Ok(token)
    }

    fn save(&self, token: &str) -> Result<(), AuthError> {
        let mut cache = self.lock()?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AuthError::Internal(format!("token dir failed: {}", e)))?;
        }
        std::fs::write(&self.path, token)
            .map_err(|e| AuthError::Internal(format!("token write failed: {}", e)))?;
        *cache = Some(Some(token.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut cache = self.lock()?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AuthError::Internal(format!("token delete failed: {}", e))),
        }
        *cache = Some(None);
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, AuthError> {
        Ok(self.token.lock().unwrap().clone())
    }

    fn save(&self, token: &str) -> Result<(), AuthError> {
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}
