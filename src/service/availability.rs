//! Read and patch a single availability row.

use super::{finish, merge_availability};
use crate::error::AppError;
use crate::model::{Availability, AvailabilityUpdate};
use sqlx::PgPool;
use uuid::Uuid;

pub struct AvailabilityService;

impl AvailabilityService {
    pub async fn read(pool: &PgPool, id: Uuid) -> Result<Availability, AppError> {
        sqlx::query_as::<_, Availability>("SELECT id, total, maintenance, broken FROM availability WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("availability {}", id)))
    }

    /// Apply counter changes. The merged row must still satisfy the availability rule, so
    /// the current row is locked while it is checked.
    pub async fn update(pool: &PgPool, id: Uuid, update: AvailabilityUpdate) -> Result<Availability, AppError> {
        if update.is_empty() {
            return Err(AppError::NoValidFields("availability"));
        }
        let mut tx = pool.begin().await?;
        let result = merge_availability(&mut tx, id, &update).await;
        finish(tx, result, "availability.update").await
    }
}
