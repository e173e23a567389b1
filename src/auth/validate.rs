use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub const USERNAME_MIN: usize = 2;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;

/// Lowercase and trim an email before any lookup or insert, so that casing
/// differences cannot smuggle a duplicate past the unique constraint.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn check_username(username: &str, errors: &mut Vec<FieldError>) {
    let len = username.chars().count();
    if len < USERNAME_MIN || len > USERNAME_MAX {
        errors.push(FieldError::new(
            "username",
            format!("must be between {USERNAME_MIN} and {USERNAME_MAX} characters"),
        ));
        return;
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        errors.push(FieldError::new(
            "username",
            "may only contain letters, digits and underscores",
        ));
    }
}

pub fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !EMAIL_RE.is_match(email) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
}

pub fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < PASSWORD_MIN {
        errors.push(FieldError::new(
            "password",
            format!("must be at least {PASSWORD_MIN} characters"),
        ));
    }
}
