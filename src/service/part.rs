//! Parts: batch loading under rentables, tree insertion, and the standalone part endpoints.
//!
//! A fixed part owns one availability row. An interchangeable part owns none and carries
//! its stock on variants instead; flipping between the two migrates that ownership.

use super::{
    ensure_availability, fetch_patched, finish, id_value, merge_availability, patch_availability, variant, verify_output,
    Returned,
};
use crate::error::AppError;
use crate::model::{Availability, Part, PartCreate, PartUpdate, PartVariant, PART_FIELDS};
use crate::sql::{build_patch_query, trim_strings, PatchOptions};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

const PART_SELECT: &str = "SELECT p.id, p.name, p.description, p.quantity, p.rentable_id, p.interchangeable, \
     a.id AS a_id, a.total, a.maintenance, a.broken \
     FROM part p LEFT JOIN availability a ON a.id = p.availability_id";

#[derive(FromRow)]
struct PartRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    quantity: i32,
    rentable_id: Uuid,
    interchangeable: bool,
    a_id: Option<Uuid>,
    total: Option<i32>,
    maintenance: Option<i32>,
    broken: Option<i32>,
}

impl PartRow {
    fn into_part(self, variants: &mut HashMap<Uuid, Vec<PartVariant>>) -> Part {
        let availability = match (self.interchangeable, self.a_id, self.total, self.maintenance, self.broken) {
            (false, Some(id), Some(total), Some(maintenance), Some(broken)) => Some(Availability {
                id,
                total,
                maintenance,
                broken,
            }),
            _ => None,
        };
        let variants = if self.interchangeable {
            Some(variants.remove(&self.id).unwrap_or_default())
        } else {
            None
        };
        Part {
            id: self.id,
            name: self.name,
            description: self.description,
            quantity: self.quantity,
            rentable_id: self.rentable_id,
            interchangeable: self.interchangeable,
            availability,
            variants,
        }
    }
}

#[derive(FromRow)]
struct PartLock {
    interchangeable: bool,
    availability_id: Option<Uuid>,
}

async fn assemble(conn: &mut PgConnection, rows: Vec<PartRow>) -> Result<Vec<Part>, AppError> {
    let interchangeable: Vec<Uuid> = rows.iter().filter(|r| r.interchangeable).map(|r| r.id).collect();
    let mut variants = variant::load_for_parts(conn, &interchangeable).await?;
    Ok(rows.into_iter().map(|r| r.into_part(&mut variants)).collect())
}

/// Parts of the given rentables, grouped by rentable id. Two queries regardless of count.
pub(crate) async fn load_for_rentables(
    conn: &mut PgConnection,
    rentable_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Part>>, AppError> {
    let mut out: HashMap<Uuid, Vec<Part>> = HashMap::new();
    if rentable_ids.is_empty() {
        return Ok(out);
    }
    let sql = format!("{} WHERE p.rentable_id = ANY($1) ORDER BY p.name, p.id", PART_SELECT);
    tracing::debug!(sql = %sql, rentables = rentable_ids.len(), "query");
    let rows = sqlx::query_as::<_, PartRow>(&sql)
        .bind(rentable_ids)
        .fetch_all(&mut *conn)
        .await?;
    for part in assemble(conn, rows).await? {
        out.entry(part.rentable_id).or_default().push(part);
    }
    Ok(out)
}

async fn load_one(conn: &mut PgConnection, id: Uuid) -> Result<Option<Part>, AppError> {
    let sql = format!("{} WHERE p.id = $1", PART_SELECT);
    let rows = sqlx::query_as::<_, PartRow>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(assemble(conn, rows).await?.into_iter().next())
}

/// Insert one part under `rentable_id` with its availability or its variants.
pub(crate) async fn insert_tree(conn: &mut PgConnection, rentable_id: Uuid, part: &PartCreate) -> Result<Uuid, AppError> {
    let (id, availability_id): (Uuid, Option<Uuid>) = sqlx::query_as(
        "INSERT INTO part (name, description, quantity, rentable_id, interchangeable) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id, availability_id",
    )
    .bind(part.name.trim())
    .bind(part.description.as_deref().map(str::trim))
    .bind(part.quantity)
    .bind(rentable_id)
    .bind(part.interchangeable)
    .fetch_one(&mut *conn)
    .await?;
    if part.interchangeable {
        variant::insert_all(conn, id, part.variants.as_deref().unwrap_or_default()).await?;
    } else {
        let aid = ensure_availability(conn, "part", id, availability_id).await?;
        if let Some(counters) = part.availability.as_ref().filter(|c| !c.is_zero()) {
            patch_availability(conn, aid, counters).await?;
        }
    }
    Ok(id)
}

pub struct PartService;

impl PartService {
    pub async fn read(pool: &PgPool, id: Uuid) -> Result<Part, AppError> {
        let mut conn = pool.acquire().await?;
        load_one(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("part {}", id)))
    }

    /// Create a part under an existing rentable and mark the rentable as having parts.
    pub async fn create(pool: &PgPool, part: PartCreate) -> Result<Part, AppError> {
        let rentable_id = part.require_rentable_id()?;
        let mut tx = pool.begin().await?;
        let result = Self::create_in(&mut tx, rentable_id, &part).await;
        let id = finish(tx, result, "part.create").await?;
        tracing::info!(%id, %rentable_id, "part created");
        verify_output(Self::read(pool, id).await?)
    }

    async fn create_in(conn: &mut PgConnection, rentable_id: Uuid, part: &PartCreate) -> Result<Uuid, AppError> {
        sqlx::query_as::<_, Returned>("SELECT id FROM rentable WHERE id = $1 FOR UPDATE")
            .bind(rentable_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("rentable {}", rentable_id)))?;
        let id = insert_tree(conn, rentable_id, part).await?;
        sqlx::query("UPDATE rentable SET has_parts = TRUE WHERE id = $1")
            .bind(rentable_id)
            .execute(&mut *conn)
            .await?;
        Ok(id)
    }

    pub async fn update(pool: &PgPool, id: Uuid, update: PartUpdate) -> Result<Part, AppError> {
        let mut tx = pool.begin().await?;
        let result = Self::update_in(&mut tx, id, &update).await;
        finish(tx, result, "part.update").await?;
        verify_output(Self::read(pool, id).await?)
    }

    async fn update_in(conn: &mut PgConnection, id: Uuid, update: &PartUpdate) -> Result<(), AppError> {
        let current = sqlx::query_as::<_, PartLock>(
            "SELECT interchangeable, availability_id FROM part WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("part {}", id)))?;

        let target = update.interchangeable.as_value().copied().unwrap_or(current.interchangeable);
        let flip = target != current.interchangeable;
        if target && update.availability.as_value().is_some() {
            return Err(AppError::Conflict("interchangeable parts have no availability of their own".into()));
        }
        if !target && update.variants.as_value().is_some() {
            return Err(AppError::Conflict("variants require an interchangeable part".into()));
        }

        let options = PatchOptions::new("part", PART_FIELDS).transform(&trim_strings);
        if let Some(q) = build_patch_query(&id_value(id), &update.patch_set(), &options)? {
            fetch_patched::<Returned>(conn, &q).await?;
        }

        if target {
            if flip {
                if let Some(aid) = current.availability_id {
                    sqlx::query("UPDATE part SET availability_id = NULL WHERE id = $1")
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("DELETE FROM availability WHERE id = $1")
                        .bind(aid)
                        .execute(&mut *conn)
                        .await?;
                }
            }
            if let Some(variants) = update.variants.as_value() {
                let removed = variant::delete_for_part(conn, id).await?;
                tracing::debug!(%id, removed, added = variants.len(), "replacing variants");
                variant::insert_all(conn, id, variants).await?;
            }
        } else {
            let existing = if flip {
                variant::delete_for_part(conn, id).await?;
                None
            } else {
                current.availability_id
            };
            let aid = ensure_availability(conn, "part", id, existing).await?;
            if let Some(counters) = update.availability.as_value() {
                merge_availability(conn, aid, counters).await.map_err(|e| match e {
                    AppError::Validation(v) => AppError::Validation(v.under("availability")),
                    other => other,
                })?;
            }
        }
        if flip {
            tracing::info!(%id, interchangeable = target, "part interchangeability changed");
        }
        Ok(())
    }

    /// Delete a part and the availability rows it owns. The parent's `has_parts` follows
    /// whether any part remains.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        let result = Self::delete_in(&mut tx, id).await;
        finish(tx, result, "part.delete").await
    }

    async fn delete_in(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        variant::delete_for_part(conn, id).await?;
        let (rentable_id, availability_id): (Uuid, Option<Uuid>) =
            sqlx::query_as("DELETE FROM part WHERE id = $1 RETURNING rentable_id, availability_id")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("part {}", id)))?;
        if let Some(aid) = availability_id {
            sqlx::query("DELETE FROM availability WHERE id = $1")
                .bind(aid)
                .execute(&mut *conn)
                .await?;
        }
        let (has_parts,): (bool,) = sqlx::query_as(
            "UPDATE rentable SET has_parts = EXISTS(SELECT 1 FROM part WHERE rentable_id = $1) \
             WHERE id = $1 RETURNING has_parts",
        )
        .bind(rentable_id)
        .fetch_one(&mut *conn)
        .await?;
        tracing::info!(%id, %rentable_id, has_parts, "part deleted");
        Ok(())
    }
}
