//! Field validators shared by the entity modules.
//!
//! Each returns `ModelError::Validation` with a message fit for API callers.

use crate::errors::ModelError;

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    if email.is_empty() || email.len() > 120 {
        return Err(ModelError::validation("invalid email"));
    }
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(l), Some(d), None) => (l, d),
        _ => return Err(ModelError::validation("invalid email")),
    };
    let domain_ok = domain
        .split('.')
        .filter(|label| !label.is_empty())
        .count()
        >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        return Err(ModelError::validation("invalid email"));
    }
    Ok(())
}

/// At least 8 characters with one digit and one uppercase letter.
pub fn validate_password(password: &str) -> Result<(), ModelError> {
    if password.len() < 8 {
        return Err(ModelError::validation("Password must be at least 8 characters long"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ModelError::validation("Password must contain at least one number"));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(ModelError::validation("Password must contain at least one uppercase letter"));
    }
    Ok(())
}

/// Optional `+`, optional country digit `1`, then 9 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<(), ModelError> {
    let rest = phone.strip_prefix('+').unwrap_or(phone);
    let digits_only = !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit());
    let len = rest.len();
    // the leading 1 is optional, so either reading may match
    let ok = digits_only && ((9..=15).contains(&len) || (rest.starts_with('1') && (10..=16).contains(&len)));
    if !ok {
        return Err(ModelError::validation("Invalid phone number format"));
    }
    Ok(())
}

pub fn validate_pincode(pincode: &str) -> Result<(), ModelError> {
    if pincode.len() != 5 || !pincode.chars().all(|c| c.is_ascii_digit()) {
        return Err(ModelError::validation("Pincode must be 5 digits"));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ModelError::validation("name required"));
    }
    if trimmed.chars().count() > 100 {
        return Err(ModelError::validation("name too long (<=100)"));
    }
    Ok(())
}

pub fn validate_location(location: &str) -> Result<(), ModelError> {
    if location.trim().is_empty() {
        return Err(ModelError::validation("location required"));
    }
    if location.chars().count() > 200 {
        return Err(ModelError::validation("location too long (<=200)"));
    }
    Ok(())
}
