//! Rental inventory: REST backend for rentable items, their parts and variants, stock
//! availability counters, and user accounts, on PostgreSQL.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod patch;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod validation;

pub use config::{AppConfig, DatabaseConfig, Environment};
pub use error::{AppError, ConfigError};
pub use patch::{Patch, PatchSet};
pub use routes::app;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_schema};
pub use validation::{Validate, Violation, Violations};
