//! Authored content loading and normalization.
//!
//! This crate is the load boundary of the engine:
//! - Content snapshot (JSON collections exported by the content repository)
//! - Legacy shape normalization into the canonical `nexus-core` model
//! - Engine tunables (TOML)
//! - Asset URL resolution
//!
//! Shape problems never fail a load. They are repaired, logged once and
//! collected in a [`LoadReport`].

pub mod assets;
pub mod error;
pub mod loaders;
pub mod normalize;

pub use assets::{AssetResolver, StorageResolver};
pub use error::{ContentWarning, Diagnostics};
pub use loaders::{
    Collection, ConfigLoader, ContentLoader, LoadFailure, LoadReport, LoadResult,
};
pub use normalize::fuzzy_true;
