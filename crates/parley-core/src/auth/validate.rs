//! Credential checks shared by every auth gateway.

use parley_types::error::AuthError;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Check the shape of an email address: one `@`, a non-empty local part,
/// and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    let email = email.trim();
    let invalid = || AuthError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let mut labels = domain.split('.');
    let dotted = domain.contains('.') && labels.all(|label| !label.is_empty());
    if !dotted {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword {
            min_len: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}
