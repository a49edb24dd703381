//! Parameterized SQL: identifiers are quoted constants from code, values are bound.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
