use serde::{Deserialize, Serialize};

use super::repo::User;
use super::role::Role;
use crate::error::ApiError;
use crate::validation::{normalize_email, validate_email, validate_name, validate_password};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

impl CreateUserRequest {
    pub fn validate(&mut self) -> Result<(), ApiError> {
        self.email = normalize_email(&self.email);
        validate_name(&self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(&mut self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            let email = normalize_email(email);
            validate_email(&email)?;
            self.email = Some(email);
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_apply() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn update_normalizes_email_when_present() {
        let mut req = UpdateUserRequest {
            email: Some(" Grace@Example.COM ".into()),
            ..Default::default()
        };
        req.validate().expect("valid update");
        assert_eq!(req.email.as_deref(), Some("grace@example.com"));
    }

    #[test]
    fn update_with_no_fields_is_detectable() {
        let req = UpdateUserRequest::default();
        assert!(req.is_empty());
    }

    #[test]
    fn update_rejects_short_password() {
        let mut req = UpdateUserRequest {
            password: Some("short".into()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
