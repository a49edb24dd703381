//! Rentable aggregates: every write touches several tables and runs as one transaction,
//! followed by a read-back that is checked against the full entity rules.

use super::{ensure_availability, fetch_patched, finish, id_value, part, patch_availability, verify_output, Returned};
use crate::error::AppError;
use crate::model::{Availability, Part, Rentable, RentableCreate, RentableUpdate, RENTABLE_FIELDS};
use crate::patch::Patch;
use crate::sql::{build_patch_query, trim_strings, PatchOptions};
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

const RENTABLE_SELECT: &str = "SELECT r.id, r.name, r.description, r.has_parts, \
     a.id AS a_id, a.total, a.maintenance, a.broken \
     FROM rentable r JOIN availability a ON a.id = r.availability_id";

#[derive(FromRow)]
struct RentableRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    has_parts: bool,
    a_id: Uuid,
    total: i32,
    maintenance: i32,
    broken: i32,
}

impl RentableRow {
    fn into_rentable(self, parts: &mut HashMap<Uuid, Vec<Part>>) -> Rentable {
        let parts = if self.has_parts {
            Some(parts.remove(&self.id).unwrap_or_default())
        } else {
            None
        };
        Rentable {
            id: self.id,
            name: self.name,
            description: self.description,
            availability: Availability {
                id: self.a_id,
                total: self.total,
                maintenance: self.maintenance,
                broken: self.broken,
            },
            has_parts: self.has_parts,
            parts,
        }
    }
}

async fn load(conn: &mut PgConnection, id: Option<Uuid>) -> Result<Vec<Rentable>, AppError> {
    let rows = match id {
        Some(id) => {
            sqlx::query_as::<_, RentableRow>(&format!("{} WHERE r.id = $1", RENTABLE_SELECT))
                .bind(id)
                .fetch_all(&mut *conn)
                .await?
        }
        None => {
            sqlx::query_as::<_, RentableRow>(&format!("{} ORDER BY r.name, r.id", RENTABLE_SELECT))
                .fetch_all(&mut *conn)
                .await?
        }
    };
    let with_parts: Vec<Uuid> = rows.iter().filter(|r| r.has_parts).map(|r| r.id).collect();
    let mut parts = part::load_for_rentables(conn, &with_parts).await?;
    Ok(rows.into_iter().map(|r| r.into_rentable(&mut parts)).collect())
}

pub struct RentableService;

impl RentableService {
    pub async fn list(pool: &PgPool) -> Result<Vec<Rentable>, AppError> {
        let mut conn = pool.acquire().await?;
        load(&mut conn, None).await
    }

    pub async fn read(pool: &PgPool, id: Uuid) -> Result<Rentable, AppError> {
        let mut conn = pool.acquire().await?;
        load(&mut conn, Some(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("rentable {}", id)))
    }

    /// Insert the rentable, its availability and its part tree. Nothing is kept unless every
    /// statement succeeds.
    pub async fn create(pool: &PgPool, rentable: RentableCreate) -> Result<Rentable, AppError> {
        let mut tx = pool.begin().await?;
        let result = Self::create_in(&mut tx, &rentable).await;
        let id = finish(tx, result, "rentable.create").await?;
        tracing::info!(%id, name = %rentable.name, "rentable created");
        verify_output(Self::read(pool, id).await?)
    }

    async fn create_in(conn: &mut PgConnection, rentable: &RentableCreate) -> Result<Uuid, AppError> {
        let (id, availability_id): (Uuid, Option<Uuid>) = sqlx::query_as(
            "INSERT INTO rentable (name, description, has_parts) VALUES ($1, $2, $3) \
             RETURNING id, availability_id",
        )
        .bind(rentable.name.trim())
        .bind(rentable.description.as_deref().map(str::trim))
        .bind(rentable.has_parts)
        .fetch_one(&mut *conn)
        .await?;
        let aid = ensure_availability(conn, "rentable", id, availability_id).await?;
        if let Some(counters) = rentable.availability.as_ref().filter(|c| !c.is_zero()) {
            patch_availability(conn, aid, counters).await?;
        }
        let parts = rentable.parts.as_deref().unwrap_or_default();
        if rentable.has_parts {
            for p in parts {
                part::insert_tree(conn, id, p).await?;
            }
        } else if !parts.is_empty() {
            tracing::warn!(%id, ignored = parts.len(), "has_parts is false, parts not stored");
        }
        Ok(id)
    }

    /// Patch the rentable's own columns and append any supplied parts.
    pub async fn update(pool: &PgPool, id: Uuid, update: RentableUpdate) -> Result<Rentable, AppError> {
        let mut tx = pool.begin().await?;
        let result = Self::update_in(&mut tx, id, &update).await;
        finish(tx, result, "rentable.update").await?;
        verify_output(Self::read(pool, id).await?)
    }

    async fn update_in(conn: &mut PgConnection, id: Uuid, update: &RentableUpdate) -> Result<(), AppError> {
        sqlx::query_as::<_, Returned>("SELECT id FROM rentable WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("rentable {}", id)))?;
        let (part_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM part WHERE rentable_id = $1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        if update.has_parts.as_value() == Some(&false) && part_count > 0 {
            return Err(AppError::Conflict(format!(
                "rentable {} still has {} part(s); delete them before clearing has_parts",
                id, part_count
            )));
        }

        let new_parts = update.parts.as_value().map(Vec::as_slice).unwrap_or_default();
        let mut set = update.patch_set();
        if !new_parts.is_empty() {
            set.insert("has_parts".into(), Patch::Value(Value::Bool(true)));
        }
        let options = PatchOptions::new("rentable", RENTABLE_FIELDS).transform(&trim_strings);
        if let Some(q) = build_patch_query(&id_value(id), &set, &options)? {
            fetch_patched::<Returned>(conn, &q).await?;
        }
        for p in new_parts {
            part::insert_tree(conn, id, p).await?;
        }
        Ok(())
    }

    /// Delete the rentable with its parts, variants and every availability row they own.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        let result = Self::delete_in(&mut tx, id).await;
        finish(tx, result, "rentable.delete").await?;
        tracing::info!(%id, "rentable deleted");
        Ok(())
    }

    async fn delete_in(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        let owned: Vec<(Option<Uuid>,)> = sqlx::query_as(
            "SELECT availability_id FROM rentable WHERE id = $1 \
             UNION ALL SELECT availability_id FROM part WHERE rentable_id = $1 \
             UNION ALL SELECT v.availability_id FROM part_variant v \
                 JOIN part p ON p.id = v.part_id WHERE p.rentable_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
        sqlx::query_as::<_, Returned>("DELETE FROM rentable WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("rentable {}", id)))?;
        let ids: Vec<Uuid> = owned.into_iter().filter_map(|(a,)| a).collect();
        if !ids.is_empty() {
            sqlx::query("DELETE FROM availability WHERE id = ANY($1)")
                .bind(&ids)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }
}
