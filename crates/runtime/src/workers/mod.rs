//! Worker tasks that back the runtime orchestration.
//!
//! The tick worker drives the update loop, while the persistence worker
//! follows world events and keeps the player profile on disk current.

mod persistence;
mod tick;

pub use persistence::{PersistenceCommand, PersistenceWorker};
pub use tick::{Command, TickWorker};
