use axum::extract::FromRef;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{
    AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, MessageResponse,
    ResetPasswordRequest, SignupRequest,
};
use super::jwt::JwtKeys;
use super::password::{hash_password, verify_password};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;
use crate::users::role::Role;

/// Identical for existing and unknown accounts, so the endpoint cannot be
/// used to probe which emails are registered.
const RESET_REQUESTED_MESSAGE: &str = "If the email exists, a reset link has been sent";

const RESET_TOKEN_LEN: usize = 48;

pub fn generate_reset_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub async fn signup(state: &AppState, mut req: SignupRequest) -> Result<AuthResponse, ApiError> {
    req.validate()?;

    if User::find_by_email(&state.db, &req.email)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        warn!(email = %req.email, "signup with already-registered email");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&req.password)?;
    let role = req.role.unwrap_or(Role::User);
    // The unique email index backstops the pre-check; a racing duplicate
    // insert surfaces as Conflict through the sqlx error conversion.
    let user = User::create(&state.db, req.name.trim(), &req.email, &hash, role).await?;

    let access_token = JwtKeys::from_ref(state).sign(user.id, &user.email)?;
    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok(AuthResponse { user, access_token })
}

pub async fn login(state: &AppState, mut req: LoginRequest) -> Result<AuthResponse, ApiError> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| {
            warn!(email = %req.email, "login with unknown email");
            ApiError::Unauthorized("Invalid credentials".into())
        })?;

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login attempt on deactivated account");
        return Err(ApiError::Unauthorized("Account is deactivated".into()));
    }

    User::touch_last_login(&state.db, user.id)
        .await
        .map_err(ApiError::internal)?;

    let access_token = JwtKeys::from_ref(state).sign(user.id, &user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse { user, access_token })
}

pub async fn forgot_password(
    state: &AppState,
    mut req: ForgotPasswordRequest,
) -> Result<MessageResponse, ApiError> {
    req.validate()?;

    if let Some(user) = User::find_by_email(&state.db, &req.email)
        .await
        .map_err(ApiError::internal)?
    {
        let token = generate_reset_token();
        let expires = OffsetDateTime::now_utc() + Duration::minutes(state.config.reset_ttl_minutes);
        User::set_reset_token(&state.db, user.id, &token, expires)
            .await
            .map_err(ApiError::internal)?;
        // TODO: deliver the token by email once an outbound mailer exists;
        // until then it only lives in the database.
        info!(user_id = %user.id, "password reset token issued");
    }

    Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
}

pub async fn reset_password(
    state: &AppState,
    req: ResetPasswordRequest,
) -> Result<MessageResponse, ApiError> {
    req.validate()?;

    let user = User::find_by_reset_token(&state.db, &req.reset_token)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| {
            warn!("reset attempted with unknown or expired token");
            ApiError::BadRequest("Invalid or expired reset token".into())
        })?;

    let hash = hash_password(&req.password)?;
    // set_password also clears the token fields, consuming the token.
    User::set_password(&state.db, user.id, &hash)
        .await
        .map_err(ApiError::internal)?;

    info!(user_id = %user.id, "password reset completed");
    Ok(MessageResponse::new("Password reset successful"))
}

pub async fn change_password(
    state: &AppState,
    user_id: Uuid,
    req: ChangePasswordRequest,
) -> Result<MessageResponse, ApiError> {
    req.validate()?;

    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !verify_password(&req.old_password, &user.password_hash)? {
        warn!(user_id = %user.id, "change-password with wrong current password");
        return Err(ApiError::Unauthorized("Current password is incorrect".into()));
    }

    let hash = hash_password(&req.new_password)?;
    User::set_password(&state.db, user.id, &hash)
        .await
        .map_err(ApiError::internal)?;

    info!(user_id = %user.id, "password changed");
    Ok(MessageResponse::new("Password changed successfully"))
}
