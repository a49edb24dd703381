//! Part variants: batch loading, insertion under a part, and standalone read/patch.

use super::{ensure_availability, fetch_patched, id_value, patch_availability, verify_output, Returned};
use crate::error::AppError;
use crate::model::{Availability, PartVariant, PartVariantCreate, PartVariantUpdate, VARIANT_FIELDS};
use crate::sql::{build_patch_query, trim_strings, PatchOptions};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

const VARIANT_SELECT: &str = "SELECT v.id, v.name, v.description, v.part_id, \
     a.id AS a_id, a.total, a.maintenance, a.broken \
     FROM part_variant v JOIN availability a ON a.id = v.availability_id";

#[derive(FromRow)]
struct VariantRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    part_id: Uuid,
    a_id: Uuid,
    total: i32,
    maintenance: i32,
    broken: i32,
}

impl From<VariantRow> for PartVariant {
    fn from(r: VariantRow) -> Self {
        PartVariant {
            id: r.id,
            name: r.name,
            description: r.description,
            part_id: r.part_id,
            availability: Availability {
                id: r.a_id,
                total: r.total,
                maintenance: r.maintenance,
                broken: r.broken,
            },
        }
    }
}

/// Variants of the given parts, grouped by part id.
pub(crate) async fn load_for_parts(
    conn: &mut PgConnection,
    part_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<PartVariant>>, AppError> {
    let mut out: HashMap<Uuid, Vec<PartVariant>> = HashMap::new();
    if part_ids.is_empty() {
        return Ok(out);
    }
    let sql = format!("{} WHERE v.part_id = ANY($1) ORDER BY v.name, v.id", VARIANT_SELECT);
    tracing::debug!(sql = %sql, parts = part_ids.len(), "query");
    let rows = sqlx::query_as::<_, VariantRow>(&sql)
        .bind(part_ids)
        .fetch_all(&mut *conn)
        .await?;
    for row in rows {
        out.entry(row.part_id).or_default().push(row.into());
    }
    Ok(out)
}

/// Insert variants under `part_id`, each with its own availability row.
pub(crate) async fn insert_all(
    conn: &mut PgConnection,
    part_id: Uuid,
    variants: &[PartVariantCreate],
) -> Result<(), AppError> {
    for v in variants {
        let (id, availability_id): (Uuid, Option<Uuid>) = sqlx::query_as(
            "INSERT INTO part_variant (name, description, part_id) VALUES ($1, $2, $3) \
             RETURNING id, availability_id",
        )
        .bind(v.name.trim())
        .bind(v.description.as_deref().map(str::trim))
        .bind(part_id)
        .fetch_one(&mut *conn)
        .await?;
        let aid = ensure_availability(conn, "part_variant", id, availability_id).await?;
        if let Some(counters) = v.availability.as_ref().filter(|c| !c.is_zero()) {
            patch_availability(conn, aid, counters).await?;
        }
    }
    Ok(())
}

/// Delete every variant of a part together with the variants' availability rows.
pub(crate) async fn delete_for_part(conn: &mut PgConnection, part_id: Uuid) -> Result<u64, AppError> {
    let owned: Vec<(Option<Uuid>,)> =
        sqlx::query_as("DELETE FROM part_variant WHERE part_id = $1 RETURNING availability_id")
            .bind(part_id)
            .fetch_all(&mut *conn)
            .await?;
    let ids: Vec<Uuid> = owned.into_iter().filter_map(|(a,)| a).collect();
    let removed = ids.len() as u64;
    if !ids.is_empty() {
        sqlx::query("DELETE FROM availability WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *conn)
            .await?;
    }
    Ok(removed)
}

pub struct VariantService;

impl VariantService {
    pub async fn list(pool: &PgPool) -> Result<Vec<PartVariant>, AppError> {
        let sql = format!("{} ORDER BY v.part_id, v.name, v.id", VARIANT_SELECT);
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query_as::<_, VariantRow>(&sql).fetch_all(pool).await?;
        Ok(rows.into_iter().map(PartVariant::from).collect())
    }

    pub async fn read(pool: &PgPool, id: Uuid) -> Result<PartVariant, AppError> {
        let sql = format!("{} WHERE v.id = $1", VARIANT_SELECT);
        sqlx::query_as::<_, VariantRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(PartVariant::from)
            .ok_or_else(|| AppError::NotFound(format!("variant {}", id)))
    }

    pub async fn update(pool: &PgPool, id: Uuid, update: PartVariantUpdate) -> Result<PartVariant, AppError> {
        let options = PatchOptions::new("part_variant", VARIANT_FIELDS).transform(&trim_strings);
        let q = build_patch_query(&id_value(id), &update.patch_set(), &options)?
            .ok_or(AppError::NoValidFields("variant"))?;
        let mut conn = pool.acquire().await?;
        let updated = fetch_patched::<Returned>(&mut conn, &q)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("variant {}", id)))?;
        drop(conn);
        verify_output(Self::read(pool, updated.id).await?)
    }
}
