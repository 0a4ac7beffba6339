//! Input validation for the auth methods.
//!
//! Runs before any key derivation so malformed input never costs a KDF
//! pass. Messages here are user-facing form errors; duplicates and
//! credential failures are decided later, against the store.

use crate::error::AuthError;

fn invalid(message: &str) -> AuthError {
    AuthError::Validation(message.to_string())
}

/// Minimal structural email check: one `@`, non-empty local part, dotted
/// domain with non-empty labels.
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let Some(domain) = parts.next() else {
        return Err(invalid("Invalid email"));
    };

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("Invalid email"));
    }
    if !domain.contains('.') || domain.split('.').any(|label| label.is_empty()) {
        return Err(invalid("Invalid email"));
    }
    if email.chars().any(|c| c.is_whitespace()) {
        return Err(invalid("Invalid email"));
    }
    Ok(())
}

/// 4-16 chars, alphanumeric plus `.` and `_`; symbols cannot lead, trail or
/// repeat back-to-back.
pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(invalid("Username is required"));
    }
    if username.len() < 4 {
        return Err(invalid("Username must be at least 4 characters long"));
    }
    if username.len() > 16 {
        return Err(invalid("Username cannot exceed 16 characters"));
    }

    let symbol = |c: char| c == '.' || c == '_';
    let valid_char = |c: char| c.is_ascii_alphanumeric() || symbol(c);
    if !username.chars().all(valid_char) {
        return Err(invalid(
            "Username can only contain alphanumeric characters and symbols (._)",
        ));
    }

    let chars: Vec<char> = username.chars().collect();
    let first = chars[0];
    let last = chars[chars.len() - 1];
    let has_symbol_run = chars.windows(2).any(|w| symbol(w[0]) && symbol(w[1]));
    if symbol(first) || symbol(last) || has_symbol_run {
        return Err(invalid(
            "Username can only contain alphanumeric characters and symbols (._)",
        ));
    }
    Ok(())
}

/// Signup passwords: at least 8 chars mixing letters, numbers and symbols.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }
    if password.len() < 8 {
        return Err(invalid("Password must be at least 8 characters long"));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());
    if !(has_letter && has_digit && has_symbol) {
        return Err(invalid(
            "Password must use a mix of letters, numbers and symbols",
        ));
    }
    Ok(())
}

pub fn validate_signup(email: &str, username: &str, password: &str) -> Result<(), AuthError> {
    validate_email(email)?;
    validate_username(username)?;
    validate_password(password)
}

/// Login only checks shape; password strength was enforced at signup.
pub fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(invalid("Password is required"));
    }
    Ok(())
}
