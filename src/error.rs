use thiserror::Error;

/// Error taxonomy for the auth subsystem.
///
/// Credential failures are deliberately generic: `InvalidCredential` never
/// reveals whether the email exists, and `Unauthenticated` never reveals why
/// a token was rejected. `Internal` carries detail for the server log only;
/// clients see a fixed message.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email is already in use")]
    DuplicateEmail,
    #[error("Username is already in use")]
    DuplicateUsername,
    #[error("Invalid email or password")]
    InvalidCredential,
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("Aborted")]
    Aborted,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// JSON-RPC error code for this error class.
    pub fn rpc_code(&self) -> i32 {
        match self {
            AuthError::Validation(_) => -32602,
            AuthError::DuplicateEmail | AuthError::DuplicateUsername => -32001,
            AuthError::InvalidCredential => -32002,
            AuthError::Unauthenticated => -32003,
            AuthError::Aborted => -32000,
            AuthError::Internal(_) => -32603,
        }
    }

    /// Message safe to put on the wire. Internal detail stays server-side.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }

    /// Only aborts and internal (transient) failures are worth retrying.
    /// Validation, duplicate and credential failures are definitive.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Aborted | AuthError::Internal(_))
    }

    /// Rebuild the error class from a JSON-RPC error on the client side.
    pub fn from_rpc(code: i32, message: &str) -> Self {
        match code {
            -32602 => AuthError::Validation(message.to_string()),
            -32001 => {
                if message.starts_with("Email") {
                    AuthError::DuplicateEmail
                } else {
                    AuthError::DuplicateUsername
                }
            }
            -32002 => AuthError::InvalidCredential,
            -32003 => AuthError::Unauthenticated,
            -32000 => AuthError::Aborted,
            _ => AuthError::Internal(message.to_string()),
        }
    }
}
