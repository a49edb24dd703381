//! User account handlers.

use crate::error::AppError;
use crate::extractors::{EntityId, ValidJson};
use crate::model::{UserCreate, UserUpdate};
use crate::response::{success_many, success_one_created, success_one_ok};
use crate::service::UserService;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(UserService::list(&state.pool).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<UserCreate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_created(UserService::create(&state.pool, body).await?))
}

pub async fn read_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(UserService::read(&state.pool, id).await?))
}

/// PUT: every field is required and replaced.
pub async fn replace_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<UserCreate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(UserService::replace(&state.pool, id, body).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<UserUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(UserService::update(&state.pool, id, body).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    UserService::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
