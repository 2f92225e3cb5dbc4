//! Repository layer for player profiles.
//!
//! Profiles are the only data that outlives a session: the inventory, tags
//! and scene a player has reached. Authored content is loaded by
//! `nexus-content` and never written back.

mod error;
mod file;
mod memory;
mod profile;

pub use error::{RepositoryError, Result};
pub use file::FileProfileRepository;
pub use memory::InMemoryProfileRepository;
pub use profile::{PlayerProfile, ProfileRepository};
