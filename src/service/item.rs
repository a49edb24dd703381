//! Standalone items and the availability row each one owns.

use super::{ensure_availability, fetch_patched, finish, id_value, verify_output, Returned};
use crate::error::AppError;
use crate::model::{Availability, Item, ItemCreate, ItemUpdate, ITEM_FIELDS};
use crate::sql::{build_patch_query, trim_strings, PatchOptions};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

const ITEM_SELECT: &str = "SELECT i.id, i.name, i.description, \
     a.id AS a_id, a.total, a.maintenance, a.broken \
     FROM item i JOIN availability a ON a.id = i.availability_id";

#[derive(FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    a_id: Uuid,
    total: i32,
    maintenance: i32,
    broken: i32,
}

impl From<ItemRow> for Item {
    fn from(r: ItemRow) -> Self {
        Item {
            id: r.id,
            name: r.name,
            description: r.description,
            availability: Availability {
                id: r.a_id,
                total: r.total,
                maintenance: r.maintenance,
                broken: r.broken,
            },
        }
    }
}

pub struct ItemService;

impl ItemService {
    pub async fn list(pool: &PgPool) -> Result<Vec<Item>, AppError> {
        let sql = format!("{} ORDER BY i.name, i.id", ITEM_SELECT);
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query_as::<_, ItemRow>(&sql).fetch_all(pool).await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    pub async fn read(pool: &PgPool, id: Uuid) -> Result<Item, AppError> {
        let sql = format!("{} WHERE i.id = $1", ITEM_SELECT);
        sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .map(Item::from)
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))
    }

    pub async fn create(pool: &PgPool, item: ItemCreate) -> Result<Item, AppError> {
        let mut tx = pool.begin().await?;
        let result = Self::create_in(&mut tx, &item).await;
        let id = finish(tx, result, "item.create").await?;
        tracing::info!(%id, "item created");
        verify_output(Self::read(pool, id).await?)
    }

    async fn create_in(conn: &mut PgConnection, item: &ItemCreate) -> Result<Uuid, AppError> {
        let (id, availability_id): (Uuid, Option<Uuid>) = sqlx::query_as(
            "INSERT INTO item (name, description) VALUES ($1, $2) RETURNING id, availability_id",
        )
        .bind(item.name.trim())
        .bind(item.description.as_deref().map(str::trim))
        .fetch_one(&mut *conn)
        .await?;
        ensure_availability(conn, "item", id, availability_id).await?;
        Ok(id)
    }

    pub async fn update(pool: &PgPool, id: Uuid, update: ItemUpdate) -> Result<Item, AppError> {
        let options = PatchOptions::new("item", ITEM_FIELDS).transform(&trim_strings);
        let q = build_patch_query(&id_value(id), &update.patch_set(), &options)?
            .ok_or(AppError::NoValidFields("item"))?;
        let mut conn = pool.acquire().await?;
        let updated = fetch_patched::<Returned>(&mut conn, &q)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))?;
        drop(conn);
        verify_output(Self::read(pool, updated.id).await?)
    }

    /// Delete an item and its availability row.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;
        let result = Self::delete_in(&mut tx, id).await;
        finish(tx, result, "item.delete").await
    }

    async fn delete_in(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        let (availability_id,): (Option<Uuid>,) =
            sqlx::query_as("DELETE FROM item WHERE id = $1 RETURNING availability_id")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("item {}", id)))?;
        if let Some(aid) = availability_id {
            sqlx::query("DELETE FROM availability WHERE id = $1")
                .bind(aid)
                .execute(&mut *conn)
                .await?;
        }
        tracing::info!(%id, "item deleted");
        Ok(())
    }
}
