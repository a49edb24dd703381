//! Database bootstrap: create the database if missing, then the inventory tables.
//!
//! Every statement is idempotent so the server can run this on each start.

use crate::error::AppError;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, PgPool};

/// Ensure the database named in `options` exists, creating it from the `postgres`
/// maintenance database if not. Call before building the main pool.
pub async fn ensure_database_exists(options: &PgConnectOptions) -> Result<(), AppError> {
    let db_name = match options.get_database() {
        Some(name) if !name.is_empty() && name != "postgres" => name.to_string(),
        _ => return Ok(()),
    };
    let admin = options.clone().database("postgres");
    let mut conn = admin.connect().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

const SCHEMA_LOCK_KEY: i64 = 0x7265_6e74_616c;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS availability (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        total INTEGER NOT NULL DEFAULT 0 CHECK (total >= 0),
        maintenance INTEGER NOT NULL DEFAULT 0 CHECK (maintenance >= 0),
        broken INTEGER NOT NULL DEFAULT 0 CHECK (broken >= 0),
        CHECK (maintenance + broken <= total)
    )",
    "CREATE TABLE IF NOT EXISTS rentable (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(32) NOT NULL,
        description VARCHAR(255),
        has_parts BOOLEAN NOT NULL DEFAULT FALSE,
        availability_id UUID REFERENCES availability (id)
    )",
    "CREATE TABLE IF NOT EXISTS part (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(32) NOT NULL,
        description VARCHAR(255),
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        rentable_id UUID NOT NULL REFERENCES rentable (id) ON DELETE CASCADE,
        interchangeable BOOLEAN NOT NULL DEFAULT FALSE,
        availability_id UUID REFERENCES availability (id)
    )",
    "CREATE INDEX IF NOT EXISTS part_rentable_id_idx ON part (rentable_id)",
    "CREATE TABLE IF NOT EXISTS part_variant (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(32) NOT NULL,
        description VARCHAR(255),
        part_id UUID NOT NULL REFERENCES part (id) ON DELETE CASCADE,
        availability_id UUID REFERENCES availability (id)
    )",
    "CREATE INDEX IF NOT EXISTS part_variant_part_id_idx ON part_variant (part_id)",
    "CREATE TABLE IF NOT EXISTS item (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(32) NOT NULL,
        description VARCHAR(255),
        availability_id UUID REFERENCES availability (id)
    )",
    "CREATE TABLE IF NOT EXISTS app_user (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        username VARCHAR(32) NOT NULL UNIQUE,
        name VARCHAR(64) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE OR REPLACE FUNCTION provision_availability() RETURNS trigger AS $$
    BEGIN
        IF NEW.availability_id IS NULL THEN
            INSERT INTO availability DEFAULT VALUES RETURNING id INTO NEW.availability_id;
        END IF;
        RETURN NEW;
    END;
    $$ LANGUAGE plpgsql",
    "DROP TRIGGER IF EXISTS rentable_provision_availability ON rentable",
    "CREATE TRIGGER rentable_provision_availability BEFORE INSERT ON rentable
        FOR EACH ROW EXECUTE FUNCTION provision_availability()",
    "DROP TRIGGER IF EXISTS part_provision_availability ON part",
    "CREATE TRIGGER part_provision_availability BEFORE INSERT ON part
        FOR EACH ROW WHEN (NEW.availability_id IS NULL AND NOT NEW.interchangeable)
        EXECUTE FUNCTION provision_availability()",
    "DROP TRIGGER IF EXISTS item_provision_availability ON item",
    "CREATE TRIGGER item_provision_availability BEFORE INSERT ON item
        FOR EACH ROW EXECUTE FUNCTION provision_availability()",
    "DROP TRIGGER IF EXISTS part_variant_provision_availability ON part_variant",
    "CREATE TRIGGER part_variant_provision_availability BEFORE INSERT ON part_variant
        FOR EACH ROW EXECUTE FUNCTION provision_availability()",
];

/// Create the inventory and user tables plus the availability-provisioning triggers.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    // Serializes concurrent bootstraps; trigger replacement is not safe to interleave.
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *tx)
        .await?;
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(statements = SCHEMA.len(), "schema ready");
    Ok(())
}
