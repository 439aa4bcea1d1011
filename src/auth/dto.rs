use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::users::repo::User;
use crate::users::role::Role;
use crate::validation::{normalize_email, validate_email, validate_name, validate_password};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

impl SignupRequest {
    /// Normalizes the email in place and checks every field.
    pub fn validate(&mut self) -> Result<(), ApiError> {
        self.email = normalize_email(&self.email);
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&mut self) -> Result<(), ApiError> {
        self.email = normalize_email(&self.email);
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

impl ForgotPasswordRequest {
    pub fn validate(&mut self) -> Result<(), ApiError> {
        self.email = normalize_email(&self.email);
        validate_email(&self.email)
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub reset_token: String,
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.reset_token.trim().is_empty() {
            return Err(ApiError::BadRequest("Reset token is required".into()));
        }
        validate_password(&self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_password(&self.old_password)?;
        validate_password(&self.new_password)
    }
}

/// Returned by signup and login. `User`'s own `Serialize` impl keeps the
/// hash and reset fields out of the payload.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_normalizes_email_before_checks() {
        let mut req = SignupRequest {
            name: "Ada".into(),
            email: "  Ada@Example.COM ".into(),
            password: "password123".into(),
            role: None,
        };
        req.validate().expect("valid request");
        assert_eq!(req.email, "ada@example.com");
    }

    #[test]
    fn signup_rejects_short_name_and_password() {
        let mut req = SignupRequest {
            name: "A".into(),
            email: "a@example.com".into(),
            password: "password123".into(),
            role: None,
        };
        assert!(req.validate().is_err());

        let mut req = SignupRequest {
            name: "Ada".into(),
            email: "a@example.com".into(),
            password: "short".into(),
            role: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn signup_role_deserializes_from_lowercase() {
        let req: SignupRequest = serde_json::from_str(
            r#"{"name":"Ada","email":"a@b.co","password":"password123","role":"admin"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Some(Role::Admin));
    }

    #[test]
    fn signup_rejects_unknown_role_at_deserialization() {
        let res: Result<SignupRequest, _> = serde_json::from_str(
            r#"{"name":"Ada","email":"a@b.co","password":"password123","role":"root"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn reset_requires_a_token() {
        let req = ResetPasswordRequest {
            reset_token: "   ".into(),
            password: "password123".into(),
        };
        assert!(req.validate().is_err());
    }
}
