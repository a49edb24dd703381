//! User account CRUD. Usernames and emails are stored lower-cased.

use super::{fetch_patched, id_value, Returned};
use crate::error::AppError;
use crate::model::{normalize_user_field, AppUser, UserCreate, UserUpdate, USER_FIELDS};
use crate::sql::{build_patch_query, PatchOptions};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, name, email, password_hash, created_at";

fn unique_to_conflict(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict("username or email already in use".into());
        }
    }
    AppError::Db(e)
}

pub struct UserService;

impl UserService {
    pub async fn list(pool: &PgPool) -> Result<Vec<AppUser>, AppError> {
        let sql = format!("SELECT {} FROM app_user ORDER BY username", USER_COLUMNS);
        Ok(sqlx::query_as::<_, AppUser>(&sql).fetch_all(pool).await?)
    }

    pub async fn read(pool: &PgPool, id: Uuid) -> Result<AppUser, AppError> {
        let sql = format!("SELECT {} FROM app_user WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, AppUser>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    pub async fn create(pool: &PgPool, user: UserCreate) -> Result<AppUser, AppError> {
        let sql = format!(
            "INSERT INTO app_user (username, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        // TODO: hash the password before storing once a hashing crate is chosen.
        let created = sqlx::query_as::<_, AppUser>(&sql)
            .bind(user.username.trim().to_lowercase())
            .bind(&user.name)
            .bind(user.email.trim().to_lowercase())
            .bind(&user.password)
            .fetch_one(pool)
            .await
            .map_err(unique_to_conflict)?;
        tracing::info!(id = %created.id, username = %created.username, "user created");
        Ok(created)
    }

    /// Full replace of every writable column.
    pub async fn replace(pool: &PgPool, id: Uuid, user: UserCreate) -> Result<AppUser, AppError> {
        let sql = format!(
            "UPDATE app_user SET username = $1, name = $2, email = $3, password_hash = $4 \
             WHERE id = $5 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, AppUser>(&sql)
            .bind(user.username.trim().to_lowercase())
            .bind(&user.name)
            .bind(user.email.trim().to_lowercase())
            .bind(&user.password)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(unique_to_conflict)?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    pub async fn update(pool: &PgPool, id: Uuid, update: UserUpdate) -> Result<AppUser, AppError> {
        let options = PatchOptions::new("app_user", USER_FIELDS).transform(&normalize_user_field);
        let q = build_patch_query(&id_value(id), &update.patch_set(), &options)?
            .ok_or(AppError::NoValidFields("user"))?;
        let mut conn = pool.acquire().await?;
        let patched = fetch_patched::<AppUser>(&mut conn, &q).await.map_err(|e| match e {
            AppError::Db(db) => unique_to_conflict(db),
            other => other,
        })?;
        patched.ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        sqlx::query_as::<_, Returned>("DELETE FROM app_user WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;
        tracing::info!(%id, "user deleted");
        Ok(())
    }
}
