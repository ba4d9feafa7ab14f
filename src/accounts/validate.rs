//! Input normalization and validation for registration and password changes.

use regex::Regex;

use super::error::AuthError;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic `local@domain.tld` shape check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@]+@[^@]+\.[^@]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

pub(crate) fn check_username(username: &str) -> Result<(), AuthError> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::validation(
            "Username must be at least 3 characters.",
        ));
    }
    Ok(())
}

pub(crate) fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::validation(
            "Password must be at least 6 characters.",
        ));
    }
    Ok(())
}

pub(crate) fn check_email(email_normalized: &str) -> Result<(), AuthError> {
    if !valid_email(email_normalized) {
        return Err(AuthError::validation(
            "Please provide a valid email address.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@b.com"));
        assert!(valid_email("name.surname@example.co.uk"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("two@@example.com"));
        assert!(!valid_email("a@nodot"));
    }

    #[test]
    fn username_and_password_minimums() {
        assert!(check_username("ab").is_err());
        assert!(check_username("abc").is_ok());
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
    }
}
