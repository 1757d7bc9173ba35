use thiserror::Error;

/// Minimum length for a password set through an invitation link.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password must be at least 8 characters long")]
    TooShort,

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one number")]
    MissingDigit,

    #[error("Passwords do not match")]
    Mismatch,
}

/// Check a new password and its confirmation, reporting the first rule that
/// fails.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(PasswordError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    if password != confirmation {
        return Err(PasswordError::Mismatch);
    }
    Ok(())
}
