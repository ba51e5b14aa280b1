//! Request bodies for the auth endpoints, with local validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::errors::{AuthError, Result};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;

/// `POST /api/auth/login` body.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
    /// Ask the backend for a long-lived session cookie.
    pub remember: bool,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remember", &self.remember)
            .finish()
    }
}

/// `POST /api/auth/register` body.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// Desired login name (at least 3 characters).
    pub username: String,
    /// Password (at least 8 characters).
    pub password: String,
    /// Must equal `password`.
    pub confirm_password: String,
    /// Contact email.
    pub email: String,
    /// Display name (at least 2 characters).
    pub name: String,
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl RegisterForm {
    /// Check every field. Returns the first failure in form order.
    pub fn validate(&self) -> Result<()> {
        min_chars("username", &self.username, MIN_USERNAME_LEN)?;
        min_chars("password", &self.password, MIN_PASSWORD_LEN)?;
        if self.password != self.confirm_password {
            return Err(invalid("confirmPassword", "passwords do not match"));
        }
        email("email", &self.email)?;
        min_chars("name", &self.name, MIN_NAME_LEN)
    }
}

/// `POST /api/auth/find-id` body.
#[derive(Clone, Debug, Serialize)]
pub struct FindIdForm {
    /// Registered email.
    pub email: String,
    /// Registered display name (at least 2 characters).
    pub name: String,
}

impl FindIdForm {
    /// Check every field. Returns the first failure in form order.
    pub fn validate(&self) -> Result<()> {
        email("email", &self.email)?;
        min_chars("name", &self.name, MIN_NAME_LEN)
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> AuthError {
    AuthError::Validation {
        field,
        message: message.into(),
    }
}

fn min_chars(field: &'static str, value: &str, min: usize) -> Result<()> {
    if value.chars().count() < min {
        return Err(invalid(
            field,
            format!("{field} must be at least {min} characters"),
        ));
    }
    Ok(())
}

fn email(field: &'static str, value: &str) -> Result<()> {
    if !EMAIL_PATTERN.is_match(value) {
        return Err(invalid(field, "enter a valid email address"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn register() -> RegisterForm {
        RegisterForm {
            username: "doc1".into(),
            password: "validpass".into(),
            confirm_password: "validpass".into(),
            email: "doc1@clinic.example".into(),
            name: "Dr. Lee".into(),
        }
    }

    fn field_of(result: Result<()>) -> &'static str {
        match result {
            Err(AuthError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_register_form_passes() {
        assert!(register().validate().is_ok());
    }

    #[test]
    fn register_field_rules() {
        let mut f = register();
        f.username = "ab".into();
        assert_eq!(field_of(f.validate()), "username");

        let mut f = register();
        f.password = "short".into();
        f.confirm_password = "short".into();
        assert_eq!(field_of(f.validate()), "password");

        let mut f = register();
        f.confirm_password = "different".into();
        assert_eq!(field_of(f.validate()), "confirmPassword");

        let mut f = register();
        f.email = "not-an-email".into();
        assert_eq!(field_of(f.validate()), "email");

        let mut f = register();
        f.name = "L".into();
        assert_eq!(field_of(f.validate()), "name");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut f = register();
        f.name = "이수".into();
        assert!(f.validate().is_ok());
    }

    #[test]
    fn find_id_rules() {
        let ok = FindIdForm {
            email: "a@b.co".into(),
            name: "Kim".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = FindIdForm {
            email: "a@b".into(),
            name: "Kim".into(),
        };
        assert_matches!(
            bad.validate(),
            Err(AuthError::Validation { field: "email", .. })
        );
    }

    #[test]
    fn register_serializes_camel_case() {
        let json = serde_json::to_value(register()).unwrap();
        assert_eq!(json["confirmPassword"], "validpass");
        assert!(json.get("confirm_password").is_none());
    }

    #[test]
    fn debug_redacts_passwords() {
        let login = LoginRequest {
            username: "doc1".into(),
            password: "validpass".into(),
            remember: false,
        };
        assert!(!format!("{login:?}").contains("validpass"));
        assert!(!format!("{:?}", register()).contains("validpass"));
    }
}
