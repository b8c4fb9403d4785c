//! The four top-level file-kind framers. See `spec.md` §4.7.

pub mod cloud;
pub mod common;
pub mod profile;
pub mod tribe;
pub mod world;

pub use cloud::{load_cloud, load_cloud_obelisk, CloudFile};
pub use profile::{load_profile, ProfileFile};
pub use tribe::{load_tribe, TribeFile};
pub use world::{load_world, WorldSave};
