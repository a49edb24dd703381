//! HTTP handlers for the inventory and user APIs.

pub mod inventory;
pub mod user;
