//! Client-side auth bridge.
//!
//! The counterpart of the server's auth methods for the mobile/web shells:
//! it persists the bearer token, re-derives the wallet locally from the
//! entropy embedded in the token, and tracks a small auth state machine:
//!
//!   Unknown -> Verifying -> Authenticated | Unauthenticated
//!
//! `Authenticated` can only fall back to `Unauthenticated` (logout or a
//! rejected verification); getting back requires a fresh login or signup.

pub mod store;

pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, SESSION_KEY};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::auth::SessionToken;
use crate::error::AuthError;
use crate::rpc::types::{AuthResult, RpcResponse, UserInfo};
use crate::rpc::validate;
use crate::wallet::Wallet;

const TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    Unknown,
    Verifying,
    Authenticated(UserInfo),
    Unauthenticated,
}

pub struct AuthClient {
    http: reqwest::Client,
    url: String,
    token_store: Arc<dyn TokenStore>,
    status: Mutex<AuthStatus>,
    wallet: Mutex<Option<Wallet>>,
    request_id: AtomicU64,
}

impl AuthClient {
    pub fn new(url: String, token_store: Arc<dyn TokenStore>) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| AuthError::Internal(format!("client build failed: {}", e)))?;
        Ok(Self {
            http,
            url,
            token_store,
            status: Mutex::new(AuthStatus::Unknown),
            wallet: Mutex::new(None),
            request_id: AtomicU64::new(1),
        })
    }

    pub fn status(&self) -> AuthStatus {
        self.status.lock().map(|s| s.clone()).unwrap_or(AuthStatus::Unknown)
    }

    /// Address of the locally derived wallet, once known.
    pub fn wallet_address(&self) -> Option<String> {
        self.wallet
            .lock()
            .ok()
            .and_then(|w| w.as_ref().map(|w| w.address().to_string()))
    }

    pub async fn signup(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<AuthResult, AuthError> {
        validate::validate_signup(email, username, password)?;
        let params = json!({ "email": email, "username": username, "password": password });
        let result = self.call_with_retry("auth.signup", params, None).await?;
        self.adopt_session(result)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResult, AuthError> {
        validate::validate_login(email, password)?;
        let params = json!({ "email": email, "password": password });
        let result = self.call_with_retry("auth.login", params, None).await?;
        self.adopt_session(result)
    }

    /// Check the persisted session against the server.
    pub async fn verify(&self) -> Result<UserInfo, AuthError> {
        let token = self
            .token_store
            .load()?
            .ok_or(AuthError::Unauthenticated)?;
        let result = self
            .call_with_retry("auth.verify", json!(null), Some(&token))
            .await?;
        let user: UserInfo = serde_json::from_value(result)
            .map_err(|e| AuthError::Internal(format!("malformed verify response: {}", e)))?;
        self.set_status(AuthStatus::Authenticated(user.clone()));
        Ok(user)
    }

    /// App-start path: decode the persisted token locally so the wallet is
    /// available for display before the network round trip, then verify the
    /// session and drop local state if the server rejects it.
    pub async fn restore(&self) -> Result<AuthStatus, AuthError> {
        let Some(raw) = self.token_store.load()? else {
            self.set_status(AuthStatus::Unauthenticated);
            return Ok(AuthStatus::Unauthenticated);
        };

        let Ok(token) = SessionToken::decode(&raw) else {
            self.clear_local()?;
            return Ok(AuthStatus::Unauthenticated);
        };
        if let Ok(wallet) = Wallet::from_entropy(&token.entropy) {
            if let Ok(mut slot) = self.wallet.lock() {
                *slot = Some(wallet);
            }
        }

        self.set_status(AuthStatus::Verifying);
        match self.verify().await {
            Ok(user) => Ok(AuthStatus::Authenticated(user)),
            Err(AuthError::Unauthenticated) | Err(AuthError::InvalidCredential) => {
                self.clear_local()?;
                Ok(AuthStatus::Unauthenticated)
            }
            // Transient failure: keep the token, stay in Verifying so the
            // caller can try again.
            Err(e) => Err(e),
        }
    }

    /// Purely local: sessions are stateless, so there is nothing to tell
    /// the server.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.clear_local()
    }

    fn adopt_session(&self, result: serde_json::Value) -> Result<AuthResult, AuthError> {
        let session: AuthResult = serde_json::from_value(result)
            .map_err(|e| AuthError::Internal(format!("malformed auth response: {}", e)))?;

        self.token_store.save(&session.session_token)?;
        let wallet = Wallet::from_entropy(&session.entropy)?;
        if let Ok(mut slot) = self.wallet.lock() {
            *slot = Some(wallet);
        }
        self.set_status(AuthStatus::Authenticated(session.user.clone()));
        Ok(session)
    }

    fn clear_local(&self) -> Result<(), AuthError> {
        self.token_store.clear()?;
        if let Ok(mut slot) = self.wallet.lock() {
            *slot = None;
        }
        self.set_status(AuthStatus::Unauthenticated);
        Ok(())
    }

    fn set_status(&self, status: AuthStatus) {
        if let Ok(mut slot) = self.status.lock() {
            *slot = status;
        }
    }

    async fn call_with_retry(
        &self,
        method: &str,
        params: serde_json::Value,
        bearer: Option<&str>,
    ) -> Result<serde_json::Value, AuthError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.call_once(method, params.clone(), bearer).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    tracing::debug!("retrying {} after {} (attempt {})", method, e, attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once(
        &self,
        method: &str,
        params: serde_json::Value,
        bearer: Option<&str>,
    ) -> Result<serde_json::Value, AuthError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let mut builder = self.http.post(&self.url).json(&request);
        if let Some(token) = bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AuthError::Aborted
            } else {
                AuthError::Internal(format!("request failed: {}", e))
            }
        })?;

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Internal(format!("malformed response: {}", e)))?;

        if let Some(error) = response.error {
            return Err(AuthError::from_rpc(error.code, &error.message));
        }
        response
            .result
            .ok_or_else(|| AuthError::Internal("response had no result".to_string()))
    }
}

/// Rewrite transport-class failures into one friendly string for display;
/// form errors pass through untouched.
pub fn parse_error_message(error: &AuthError) -> String {
    match error {
        AuthError::Aborted | AuthError::Internal(_) => {
            "An unexpected error occurred, please try again later".to_string()
        }
        other => other.to_string(),
    }
}
