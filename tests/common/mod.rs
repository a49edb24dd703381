//! Shared setup for tests that need a live PostgreSQL. Tests return early when
//! `DATABASE_URL` is not set.

#![allow(dead_code)]

use rental_inventory::{ensure_schema, AppConfig};
use sqlx::PgPool;

pub async fn pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("DATABASE_URL not set; skipping");
            return None;
        }
    };
    let config = AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some(url.clone()),
        "APP_ENV" => Some("test".into()),
        _ => None,
    })
    .expect("test config");
    let pool = config.database.connect().await.expect("connect");
    ensure_schema(&pool).await.expect("schema");
    Some(pool)
}

/// A name unlikely to collide across runs, within the 32 character limit.
pub fn unique_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..12])
}
