//! Form validation helpers. Checks run before any store call and block
//! the request with a field-tagged 400 on failure.

use crate::error::{AppError, AppResult};

pub fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::field(field, "must not be empty"));
    }
    Ok(())
}

/// Lightweight shape check: nonempty local part, one '@', a dot in the
/// domain.
pub fn email(field: &str, value: &str) -> AppResult<()> {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return Err(AppError::field(field, "is not a valid email address"));
    };
    if local.is_empty() || domain.len() < 3 || !domain.contains('.') || domain.contains('@') {
        return Err(AppError::field(field, "is not a valid email address"));
    }
    Ok(())
}

/// Accepts digits with an optional leading '+' and common separators;
/// 6 to 15 digits once separators are stripped.
pub fn phone(field: &str, value: &str) -> AppResult<()> {
    let trimmed = value.trim();
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = rest
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::field(field, "is not a valid phone number"));
    }
    if !(6..=15).contains(&digits.len()) {
        return Err(AppError::field(field, "is not a valid phone number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_phone_shapes() {
        assert!(phone("phone", "+33 6 12 34 56 78").is_ok());
        assert!(phone("phone", "0612345678").is_ok());
        assert!(phone("phone", "(514) 555-0199").is_ok());
    }

    #[test]
    fn rejects_bad_phones() {
        assert!(phone("phone", "call me").is_err());
        assert!(phone("phone", "123").is_err());
        assert!(phone("phone", "").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(email("email", "a@b.fr").is_ok());
        assert!(email("email", "nope").is_err());
        assert!(email("email", "@b.fr").is_err());
        assert!(email("email", "a@nodot").is_err());
    }
}
