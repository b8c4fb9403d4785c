//! World save file framer: dispatches to the Legacy binary or Modern SQLite
//! sub-path. See `spec.md` §4.7.

pub mod legacy;
pub mod modern;

pub use legacy::LegacyWorldSave;
pub use modern::ModernWorldSave;

use crate::detect::detect;
use crate::error::Result;
use crate::options::DecoderOptions;
use std::path::Path;

#[derive(Debug)]
pub enum WorldSave {
    Legacy(LegacyWorldSave),
    Modern(ModernWorldSave),
}

/// Load a world save. The Modern (SQLite) sub-path requires a real file on
/// disk; the Legacy binary sub-path can be parsed from an in-memory buffer.
pub fn load_world(path: &Path, opts: &DecoderOptions) -> Result<WorldSave> {
    let data = std::fs::read(path)?;
    let detection = detect(Some(path), &data)?;
    if detection.is_sqlite {
        Ok(WorldSave::Modern(modern::load_world_modern(path, opts)?))
    } else {
        Ok(WorldSave::Legacy(legacy::load_world_legacy(&data, opts)?))
    }
}
