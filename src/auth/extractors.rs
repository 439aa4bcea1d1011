use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;
use crate::users::role::Role;

/// The authenticated caller, attached to a handler after the bearer token
/// checks out and the account is confirmed live and active.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
}

impl CurrentUser {
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Insufficient role".into()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("No token provided".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "bearer token rejected");
            match e {
                TokenError::Expired => ApiError::Unauthorized("Token has expired".into()),
                TokenError::Invalid => ApiError::Unauthorized("Invalid token".into()),
            }
        })?;

        // The token is stateless, so the account is re-checked on every
        // request: a deleted or deactivated user keeps a valid signature but
        // must not get through.
        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::internal)?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject no longer exists");
                ApiError::Unauthorized("User not found or deleted".into())
            })?;

        if !user.is_active {
            warn!(user_id = %user.id, "blocked account tried to authenticate");
            return Err(ApiError::Forbidden(
                "Your account has been blocked. Please contact an administrator.".into(),
            ));
        }

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            is_email_verified: user.is_email_verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            role,
            is_active: true,
            is_email_verified: true,
        }
    }

    #[test]
    fn require_role_accepts_listed_roles() {
        assert!(caller(Role::Admin).require_role(&[Role::Admin]).is_ok());
        assert!(caller(Role::Moderator)
            .require_role(&[Role::Admin, Role::Moderator])
            .is_ok());
    }

    #[test]
    fn require_role_rejects_with_forbidden() {
        let err = caller(Role::User)
            .require_role(&[Role::Admin])
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
