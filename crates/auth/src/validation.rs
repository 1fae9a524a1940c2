//! Input validation for registration requests.

use regex::Regex;

use crate::AuthError;

pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DEPARTMENT_NAME_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 32;

/// Trim and lower-case an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    let email_regex = Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .map_err(|_| AuthError::validation("Invalid email regex"))?;

    if email.len() > MAX_EMAIL_LEN {
        return Err(AuthError::validation("Email is too long"));
    }

    if !email_regex.is_match(email) {
        return Err(AuthError::validation("Invalid email format"));
    }

    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.len() < 3 {
        return Err(AuthError::validation(
            "Username must be at least 3 characters long",
        ));
    }

    if username.len() > 30 {
        return Err(AuthError::validation(
            "Username must be at most 30 characters long",
        ));
    }

    let username_regex = Regex::new(r"^[a-zA-Z0-9_-]+$")
        .map_err(|_| AuthError::validation("Invalid username regex"))?;

    if !username_regex.is_match(username) {
        return Err(AuthError::validation(
            "Username can only contain letters, numbers, underscores, and hyphens",
        ));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < 6 {
        return Err(AuthError::validation(
            "Password must be at least 6 characters long",
        ));
    }
    if length > 128 {
        return Err(AuthError::validation(
            "Password must be at most 128 characters long",
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AuthError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < 3 {
        return Err(AuthError::validation("Name must be at least 3 characters long"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::validation("Name is too long"));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), AuthError> {
    if phone.len() > MAX_PHONE_LEN {
        return Err(AuthError::validation("Phone number is too long"));
    }
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')');
    if !phone.chars().all(allowed) {
        return Err(AuthError::validation("Phone number contains invalid characters"));
    }
    Ok(())
}

pub fn validate_department_name(name: &str) -> Result<(), AuthError> {
    if name.trim().chars().count() > MAX_DEPARTMENT_NAME_LEN {
        return Err(AuthError::validation("Department name is too long"));
    }
    Ok(())
}
