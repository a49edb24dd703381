//! Request extractors: validated JSON bodies and UUID path ids.

pub mod id;
pub mod json;

pub use id::EntityId;
pub use json::ValidJson;
