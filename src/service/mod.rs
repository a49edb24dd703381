//! Inventory and user operations. Multi-statement writes run inside one transaction.

pub mod availability;
pub mod item;
pub mod part;
pub mod rentable;
pub mod user;
pub mod variant;

pub use availability::AvailabilityService;
pub use item::ItemService;
pub use part::PartService;
pub use rentable::RentableService;
pub use user::UserService;
pub use variant::VariantService;

use crate::error::AppError;
use crate::model::{Availability, AvailabilityCreate, AvailabilityUpdate, AVAILABILITY_FIELDS};
use crate::sql::{build_patch_query, quoted, PatchOptions, PgBindValue, QueryBuf};
use crate::validation::Validate;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, Postgres, Transaction};
use uuid::Uuid;

/// Run a built UPDATE ... RETURNING * and map the returned row.
pub(crate) async fn fetch_patched<T>(conn: &mut PgConnection, q: &QueryBuf) -> Result<Option<T>, AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query_as::<_, T>(&q.sql);
    // The trailing parameter is the row key.
    if let Some((key, values)) = q.params.split_last() {
        for p in values {
            query = query.bind(PgBindValue::from(p));
        }
        query = query.bind(PgBindValue::key(key));
    }
    Ok(query.fetch_optional(&mut *conn).await?)
}

/// Return the owner's availability row id, creating and linking a zero row when storage
/// did not provision one.
pub(crate) async fn ensure_availability(
    conn: &mut PgConnection,
    table: &str,
    owner_id: Uuid,
    current: Option<Uuid>,
) -> Result<Uuid, AppError> {
    if let Some(id) = current {
        return Ok(id);
    }
    tracing::debug!(table, %owner_id, "provisioning availability row");
    let (id,): (Uuid,) = sqlx::query_as("INSERT INTO availability DEFAULT VALUES RETURNING id")
        .fetch_one(&mut *conn)
        .await?;
    sqlx::query(&format!("UPDATE {} SET availability_id = $1 WHERE id = $2", quoted(table)))
        .bind(id)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;
    Ok(id)
}

/// `RETURNING *` rows where only the id matters.
#[derive(FromRow)]
pub(crate) struct Returned {
    pub(crate) id: Uuid,
}

/// Overwrite the counters of a freshly provisioned availability row with create input.
pub(crate) async fn patch_availability(
    conn: &mut PgConnection,
    availability_id: Uuid,
    counters: &AvailabilityCreate,
) -> Result<(), AppError> {
    let options = PatchOptions::new("availability", AVAILABILITY_FIELDS);
    let Some(q) = build_patch_query(&id_value(availability_id), &counters.patch_set(), &options)? else {
        return Ok(());
    };
    fetch_patched::<Availability>(conn, &q)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("availability {}", availability_id)))?;
    Ok(())
}

/// Lock an availability row, check the counters it will hold after `update`, then write
/// only the counters the update carries.
pub(crate) async fn merge_availability(
    conn: &mut PgConnection,
    availability_id: Uuid,
    update: &AvailabilityUpdate,
) -> Result<Availability, AppError> {
    let current = sqlx::query_as::<_, Availability>(
        "SELECT id, total, maintenance, broken FROM availability WHERE id = $1 FOR UPDATE",
    )
    .bind(availability_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("availability {}", availability_id)))?;
    update.apply_to(&current).validate()?;
    let options = PatchOptions::new("availability", AVAILABILITY_FIELDS);
    match build_patch_query(&id_value(availability_id), &update.patch_set(), &options)? {
        Some(q) => fetch_patched::<Availability>(conn, &q)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("availability {}", availability_id))),
        None => Ok(current),
    }
}

/// Commit on success, roll back otherwise. The caller sees the error that caused the rollback.
pub(crate) async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<T, AppError>,
    op: &'static str,
) -> Result<T, AppError> {
    match result {
        Ok(v) => {
            tx.commit().await?;
            Ok(v)
        }
        Err(e) => {
            match tx.rollback().await {
                Ok(()) => tracing::warn!(op, error = %e, "transaction rolled back"),
                Err(rb) => tracing::error!(op, error = %e, rollback_error = %rb, "rollback failed"),
            }
            Err(e)
        }
    }
}

/// Re-check an aggregate read back after a write. A violation here is a server bug.
pub(crate) fn verify_output<T: Validate>(value: T) -> Result<T, AppError> {
    value.validate().map_err(|v| {
        tracing::error!(entity = T::ENTITY, violations = %v, "output failed validation");
        AppError::Internal(format!("{} output failed validation", T::ENTITY))
    })
}

pub(crate) fn id_value(id: Uuid) -> Value {
    Value::String(id.to_string())
}
