use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{CreateUserRequest, Pagination, UpdateUserRequest, UserListResponse};
use super::repo::{User, UserChanges};
use super::role::Role;
use crate::auth::password::hash_password;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, caller, payload))]
async fn create_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    caller.require_role(&[Role::Admin])?;
    payload.validate()?;

    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        warn!(email = %payload.email, "create_user with taken email");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let role = payload.role.unwrap_or(Role::User);
    let user = User::create(&state.db, payload.name.trim(), &payload.email, &hash, role).await?;

    info!(user_id = %user.id, created_by = %caller.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, caller))]
async fn list_users(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<UserListResponse>, ApiError> {
    caller.require_role(&[Role::Admin, Role::Moderator])?;

    let limit = p.limit.clamp(1, 100);
    let offset = p.offset.max(0);
    let users = User::list(&state.db, limit, offset)
        .await
        .map_err(ApiError::internal)?;
    let total = User::count(&state.db).await.map_err(ApiError::internal)?;

    Ok(Json(UserListResponse { users, total }))
}

#[instrument(skip(state, _caller))]
async fn get_user(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound(format!("User with ID {id} not found")))?;
    Ok(Json(user))
}

#[instrument(skip(state, caller, payload))]
async fn update_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    payload.validate()?;
    if payload.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".into()));
    }

    // A new password goes through the same hasher as signup; plain text
    // never reaches the database.
    let password_hash = match &payload.password {
        Some(plain) => Some(hash_password(plain)?),
        None => None,
    };

    let changes = UserChanges {
        name: payload.name.map(|n| n.trim().to_string()),
        email: payload.email,
        password_hash,
        role: payload.role,
        is_active: payload.is_active,
    };

    let user = User::update(&state.db, id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User with ID {id} not found")))?;

    info!(user_id = %user.id, updated_by = %caller.id, "user updated");
    Ok(Json(user))
}

#[instrument(skip(state, caller))]
async fn delete_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    caller.require_role(&[Role::Admin])?;

    if !User::delete(&state.db, id).await.map_err(ApiError::internal)? {
        return Err(ApiError::NotFound(format!("User with ID {id} not found")));
    }

    info!(user_id = %id, deleted_by = %caller.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
