use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

use crate::model::ids::UserId;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\S+@\S+\.\S+").expect("email pattern should compile")
});

//
// ─── USER ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Successful login or signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    #[serde(default, alias = "refreshToken", skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

//
// ─── FORM VALIDATION ───────────────────────────────────────────────────────────
//

/// A single field-level problem in a login or signup form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldError {
    NameRequired,
    EmailRequired,
    EmailInvalid,
    PasswordRequired,
    PasswordTooShort,
    ConfirmationRequired,
    ConfirmationMismatch,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FieldError::NameRequired => "Name is required",
            FieldError::EmailRequired => "Email is required",
            FieldError::EmailInvalid => "Email is invalid",
            FieldError::PasswordRequired => "Password is required",
            FieldError::PasswordTooShort => "Password must be at least 6 characters",
            FieldError::ConfirmationRequired => "Please confirm your password",
            FieldError::ConfirmationMismatch => "Passwords do not match",
        };
        f.write_str(msg)
    }
}

/// Every field failure found in a form. Never empty.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid form: {}", join(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    fn check(errors: Vec<FieldError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }

    #[must_use]
    pub fn contains(&self, field: FieldError) -> bool {
        self.errors.contains(&field)
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.is_empty() {
        errors.push(FieldError::EmailRequired);
    } else if !EMAIL_RE.is_match(email) {
        errors.push(FieldError::EmailInvalid);
    }
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.is_empty() {
        errors.push(FieldError::PasswordRequired);
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::PasswordTooShort);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns `ValidationError` listing each missing or malformed field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);
        ValidationError::check(errors)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub confirm_password: String,
}

impl SignupForm {
    /// # Errors
    ///
    /// Returns `ValidationError` listing each missing or malformed field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::NameRequired);
        }
        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);
        if self.confirm_password.is_empty() {
            errors.push(FieldError::ConfirmationRequired);
        } else if self.confirm_password != self.password {
            errors.push(FieldError::ConfirmationMismatch);
        }
        ValidationError::check(errors)
    }
}
