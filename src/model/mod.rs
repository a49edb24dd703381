//! Request and response shapes with their invariants.

pub mod availability;
pub mod item;
pub mod part;
pub mod rentable;
pub mod user;
pub mod variant;

pub use availability::*;
pub use item::*;
pub use part::*;
pub use rentable::*;
pub use user::*;
pub use variant::*;
