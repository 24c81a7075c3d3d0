// ============================
// backend-lib/src/services/mod.rs
// ============================
//! Internal services reached through the gateway.

pub mod room;
pub mod user;

pub use room::RoomDirectory;
pub use user::{UserDirectory, UserRegisteredHandler};
