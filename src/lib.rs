//! Decodes ARK: Survival Evolved / Ascended save files (player profile,
//! tribe, cloud inventory, world save) into a language-neutral object
//! graph. Read-only; does not interpret game rules or export formats.

pub mod container;
pub mod context;
pub mod detect;
pub mod error;
pub mod files;
pub mod framing;
pub mod name;
pub mod object;
pub mod options;
pub mod properties;
pub mod reader;
pub mod structs;
pub mod value;

pub use container::Container;
pub use detect::{detect, Detection, FileKind, Generation};
pub use error::{DecodeError, Result};
pub use files::{
    load_cloud, load_cloud_obelisk, load_profile, load_tribe, load_world, CloudFile, ProfileFile,
    TribeFile, WorldSave,
};
pub use name::{Name, NameTable};
pub use object::{GameObject, Location};
pub use options::DecoderOptions;
pub use structs::{NativeStruct, StructValue};
pub use value::{ArrayValue, ByteValue, MapValue, ObjectRef, Property, PropertyValue, SoftObjectRef};

use std::path::Path;

/// Load a player profile (`.arkprofile`) from its path.
pub fn load_profile_file(path: &Path, opts: &DecoderOptions) -> Result<ProfileFile> {
    let data = std::fs::read(path)?;
    load_profile(Some(path), &data, opts)
}

/// Load a tribe file (`.arktribe`) from its path.
pub fn load_tribe_file(path: &Path, opts: &DecoderOptions) -> Result<TribeFile> {
    let data = std::fs::read(path)?;
    load_tribe(Some(path), &data, opts)
}

/// Load a cloud inventory file (no extension) from its path.
pub fn load_cloud_file(path: &Path, opts: &DecoderOptions) -> Result<CloudFile> {
    let data = std::fs::read(path)?;
    load_cloud(Some(path), &data, opts)
}
