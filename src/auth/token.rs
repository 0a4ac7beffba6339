//! Bearer-session token codec.
//!
//! Wire format is `email + "." + entropy`. Emails may legitimately contain
//! `.` (`first.last@domain.com`), so decoding splits at the *last* dot. That
//! only works because entropy is lowercase hex and can never contain a dot;
//! `encode` enforces the alphabet instead of assuming it.

use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub email: String,
    pub entropy: String,
}

impl SessionToken {
    pub fn new(email: impl Into<String>, entropy: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            entropy: entropy.into(),
        }
    }

    /// Serialize to the wire format.
    ///
    /// Fails with `Internal` if the entropy would break the split-at-last-dot
    /// rule; this can only happen on a programming error, never on user input.
    pub fn encode(&self) -> Result<String, AuthError> {
        if self.email.is_empty() {
            return Err(AuthError::Internal("token email is empty".to_string()));
        }
        if self.entropy.is_empty()
            || !self
                .entropy
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(AuthError::Internal(
                "token entropy is not lowercase hex".to_string(),
            ));
        }
        Ok(format!("{}.{}", self.email, self.entropy))
    }

    /// Parse a wire token. Any malformed shape is `Unauthenticated`; the
    /// caller must not leak a more specific reason.
    pub fn decode(raw: &str) -> Result<Self, AuthError> {
        let split_index = raw.rfind('.').ok_or(AuthError::Unauthenticated)?;
        let email = &raw[..split_index];
        let entropy = &raw[split_index + 1..];

        if email.is_empty() || entropy.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        Ok(Self::new(email, entropy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTROPY: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_round_trip_plain_email() {
        let token = SessionToken::new("rider@example.com", ENTROPY);
        let decoded = SessionToken::decode(&token.encode().unwrap()).unwrap();
        assert_eq!(decoded, token);
    }

    #[test]
    fn test_round_trip_dotted_email() {
        // Dots in the local part must survive: only the last dot splits.
        let token = SessionToken::new("a.b@example.co.uk", ENTROPY);
        let decoded = SessionToken::decode(&token.encode().unwrap()).unwrap();
        assert_eq!(decoded.email, "a.b@example.co.uk");
        assert_eq!(decoded.entropy, ENTROPY);
    }

    #[test]
    fn test_decode_rejects_missing_separator() {
        let err = SessionToken::decode("no-separator-here").unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[test]
    fn test_decode_rejects_empty_sides() {
        assert!(SessionToken::decode(".abcdef").is_err());
        assert!(SessionToken::decode("rider@example.com.").is_err());
        assert!(SessionToken::decode(".").is_err());
    }

    #[test]
    fn test_encode_rejects_dotted_entropy() {
        // An entropy containing a dot would make the token ambiguous.
        let token = SessionToken::new("rider@example.com", "abc.def");
        assert!(token.encode().is_err());
    }

    #[test]
    fn test_encode_rejects_non_hex_entropy() {
        let token = SessionToken::new("rider@example.com", "ABCDEF");
        assert!(token.encode().is_err());
        let token = SessionToken::new("rider@example.com", "");
        assert!(token.encode().is_err());
    }
}
