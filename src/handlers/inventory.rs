//! Inventory handlers: rentables, parts, availability, variants and items.

use crate::error::AppError;
use crate::extractors::{EntityId, ValidJson};
use crate::model::{
    AvailabilityUpdate, ItemCreate, ItemUpdate, PartCreate, PartUpdate, PartVariantUpdate, RentableCreate, RentableUpdate,
};
use crate::response::{success_many, success_one_created, success_one_ok};
use crate::service::{AvailabilityService, ItemService, PartService, RentableService, VariantService};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

pub async fn list_rentables(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = RentableService::list(&state.pool).await?;
    Ok(success_many(rows))
}

pub async fn create_rentable(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RentableCreate>,
) -> Result<impl IntoResponse, AppError> {
    let created = RentableService::create(&state.pool, body).await?;
    Ok(success_one_created(created))
}

pub async fn read_rentable(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(RentableService::read(&state.pool, id).await?))
}

pub async fn update_rentable(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<RentableUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(RentableService::update(&state.pool, id, body).await?))
}

pub async fn delete_rentable(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    RentableService::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_part(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<PartCreate>,
) -> Result<impl IntoResponse, AppError> {
    let created = PartService::create(&state.pool, body).await?;
    Ok(success_one_created(created))
}

pub async fn read_part(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(PartService::read(&state.pool, id).await?))
}

pub async fn update_part(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<PartUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(PartService::update(&state.pool, id, body).await?))
}

pub async fn delete_part(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    PartService::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn read_availability(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(AvailabilityService::read(&state.pool, id).await?))
}

pub async fn update_availability(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<AvailabilityUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(AvailabilityService::update(&state.pool, id, body).await?))
}

pub async fn list_variants(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(VariantService::list(&state.pool).await?))
}

pub async fn read_variant(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(VariantService::read(&state.pool, id).await?))
}

pub async fn update_variant(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<PartVariantUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(VariantService::update(&state.pool, id, body).await?))
}

pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(ItemService::list(&state.pool).await?))
}

pub async fn create_item(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ItemCreate>,
) -> Result<impl IntoResponse, AppError> {
    let created = ItemService::create(&state.pool, body).await?;
    Ok(success_one_created(created))
}

pub async fn read_item(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(ItemService::read(&state.pool, id).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<ItemUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(ItemService::update(&state.pool, id, body).await?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<StatusCode, AppError> {
    ItemService::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
