//! Classifies an input by extension and header bytes: which of the four
//! file kinds it is, which generation (Legacy/Modern), and whether a
//! world save is the Modern SQLite variant.

use crate::error::{DecodeError, Result};
use std::path::Path;

const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Profile,
    Tribe,
    Cloud,
    WorldSave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Legacy,
    Modern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub kind: FileKind,
    pub generation: Generation,
    pub is_sqlite: bool,
}

/// `path` is used only for its extension; `data` is the full file contents.
pub fn detect(path: Option<&Path>, data: &[u8]) -> Result<Detection> {
    if data.len() >= 16 && &data[0..16] == SQLITE_MAGIC {
        return Ok(Detection {
            kind: FileKind::WorldSave,
            generation: Generation::Modern,
            is_sqlite: true,
        });
    }

    let ext = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    if ext.as_deref() == Some("ark") {
        if data.len() < 2 {
            return Err(DecodeError::CorruptHeader(
                "world save shorter than version field".into(),
            ));
        }
        let version = i16::from_le_bytes([data[0], data[1]]);
        if (5..=12).contains(&version) {
            return Ok(Detection {
                kind: FileKind::WorldSave,
                generation: Generation::Legacy,
                is_sqlite: false,
            });
        }
        return Err(DecodeError::CorruptHeader(format!(
            "world save version {version} out of range [5, 12]"
        )));
    }

    if data.len() < 24 {
        return Err(DecodeError::CorruptHeader(
            "file shorter than minimal header".into(),
        ));
    }
    let version = i32::from_le_bytes(data[0..4].try_into().unwrap());
    let generation = if version >= 7 {
        Generation::Modern
    } else if (1..=6).contains(&version) {
        let probe = &data[8..24];
        if probe.iter().any(|&b| b != 0) {
            Generation::Modern
        } else {
            Generation::Legacy
        }
    } else {
        return Err(DecodeError::CorruptHeader(format!(
            "version {version} out of range"
        )));
    };

    let kind = match ext.as_deref() {
        Some("arkprofile") => FileKind::Profile,
        Some("arktribe") => FileKind::Tribe,
        None => FileKind::Cloud,
        Some(other) => {
            return Err(DecodeError::CorruptHeader(format!(
                "unrecognized extension '{other}'"
            )))
        }
    };

    Ok(Detection {
        kind,
        generation,
        is_sqlite: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_magic_detects_modern_world_save() {
        let mut data = SQLITE_MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 16]);
        let d = detect(None, &data).unwrap();
        assert_eq!(d.kind, FileKind::WorldSave);
        assert_eq!(d.generation, Generation::Modern);
        assert!(d.is_sqlite);
    }

    #[test]
    fn ark_extension_with_legacy_version_detects_legacy_world_save() {
        let mut data = 9i16.to_le_bytes().to_vec();
        data.extend_from_slice(&[0u8; 32]);
        let d = detect(Some(Path::new("TheIsland.ark")), &data).unwrap();
        assert_eq!(d.kind, FileKind::WorldSave);
        assert_eq!(d.generation, Generation::Legacy);
    }

    #[test]
    fn arkprofile_with_low_version_and_zero_probe_is_legacy() {
        let mut data = 1i32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0u8; 32]);
        let d = detect(Some(Path::new("p.arkprofile")), &data).unwrap();
        assert_eq!(d.kind, FileKind::Profile);
        assert_eq!(d.generation, Generation::Legacy);
    }

    #[test]
    fn arkprofile_with_low_version_and_nonzero_probe_is_modern() {
        let mut data = 1i32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&[1u8; 16]);
        data.extend_from_slice(&[0u8; 12]);
        let d = detect(Some(Path::new("p.arkprofile")), &data).unwrap();
        assert_eq!(d.generation, Generation::Modern);
    }

    #[test]
    fn no_extension_is_cloud_inventory() {
        let mut data = 7i32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0u8; 32]);
        let d = detect(None, &data).unwrap();
        assert_eq!(d.kind, FileKind::Cloud);
        assert_eq!(d.generation, Generation::Modern);
    }
}
