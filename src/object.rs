//! Game objects, locations, and the per-encoding object-header readers
//! file framers drive. See `spec.md` §3 and §4.6.

use crate::context::PropertyContext;
use crate::error::{DecodeError, Result};
use crate::name::{Name, NameTable};
use crate::reader::Reader;
use crate::value::Property;
use serde::Serialize;
use uuid::Uuid;

/// An object's world transform. `f32` in Legacy files, `f64` in Modern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Location {
    pub fn read(reader: &mut Reader, legacy: bool) -> Result<Self> {
        let mut next = || -> Result<f64> {
            if legacy {
                Ok(reader.read_f32()? as f64)
            } else {
                reader.read_f64()
            }
        };
        Ok(Location {
            x: next()?,
            y: next()?,
            z: next()?,
            pitch: next()?,
            yaw: next()?,
            roll: next()?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameObject {
    pub id: Option<i32>,
    pub guid: Option<Uuid>,
    pub class_name: String,
    pub is_item: bool,
    pub names: Vec<Name>,
    pub from_data_file: bool,
    pub data_file_index: i32,
    pub location: Option<Location>,
    pub properties_offset: i32,
    pub properties: Vec<Property>,
    pub extra_data: Option<Vec<u8>>,
    /// Populated by `Container::build_relationships` after all objects are
    /// decoded; an arena index into the container's object vector.
    pub parent: Option<usize>,
    pub components: indexmap::IndexMap<String, usize>,
}

impl GameObject {
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.get_property_indexed(name, 0)
    }

    pub fn get_property_indexed(&self, name: &str, index: i32) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.text == name && p.array_index == index)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name.text == name)
    }

    /// The last name in `names`, used to look a component's parent up by
    /// primary name. `None` for a non-component object (`names.len() < 2`).
    pub fn parent_lookup_name(&self) -> Option<&str> {
        if self.names.len() >= 2 {
            self.names.last().map(|n| n.text.as_str())
        } else {
            None
        }
    }

    /// The object's own primary name, used as the by-primary-name index
    /// key and as the lookup target for its components.
    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(|n| n.text.as_str())
    }
}

/// Shared fields parsed from a Legacy-framing object header (`spec.md`
/// §4.6's first bullet; all four file kinds in the Legacy generation, plus
/// Legacy world-saves v>=6 using a dense name table).
pub struct LegacyHeader {
    pub guid: Uuid,
    pub class_name: Name,
    pub is_item: bool,
    pub names: Vec<Name>,
    pub from_data_file: bool,
    pub data_file_index: i32,
    pub location: Option<Location>,
    pub properties_offset: i32,
}

pub fn read_legacy_header(reader: &mut Reader, name_table: &NameTable) -> Result<LegacyHeader> {
    let guid = reader.read_guid()?;
    let class_name = name_table.read_name(reader)?;
    let is_item = reader.read_bool_u32()?;
    let name_count = reader.read_i32()?;
    let mut names = Vec::with_capacity(name_count.max(0) as usize);
    for _ in 0..name_count.max(0) {
        names.push(name_table.read_name(reader)?);
    }
    let from_data_file = reader.read_bool_u32()?;
    let data_file_index = reader.read_i32()?;
    let has_location = reader.read_bool_u32()?;
    let location = if has_location {
        Some(Location::read(reader, true)?)
    } else {
        None
    };
    let properties_offset = reader.read_i32()?;
    let _reserved = reader.read_i32()?;
    Ok(LegacyHeader {
        guid,
        class_name,
        is_item,
        names,
        from_data_file,
        data_file_index,
        location,
        properties_offset,
    })
}

/// A Modern, non-world-save object header (profile/tribe/cloud). `spec.md`
/// §4.6's second bullet.
pub struct ModernHeader {
    pub guid: Uuid,
    pub class_name: String,
    pub names: Vec<Name>,
    pub stored_properties_offset: i32,
}

pub fn read_modern_header(reader: &mut Reader, version: i32) -> Result<ModernHeader> {
    let guid = reader.read_guid()?;
    let class_name = reader.read_string()?;
    let _unknown = reader.read_i32()?;
    let name_count = reader.read_i32()?;
    let mut names = Vec::with_capacity(name_count.max(0) as usize);
    for _ in 0..name_count.max(0) {
        names.push(Name::from_inline(&reader.read_string()?));
    }
    reader.read_bytes(12)?;
    let stored_properties_offset = reader.read_i32()?;
    reader.read_bytes(4)?;
    if version >= 7 {
        let terminator = reader.peek(1)?;
        if terminator[0] == 0 {
            reader.skip(1)?;
        }
    }
    Ok(ModernHeader {
        guid,
        class_name,
        names,
        stored_properties_offset,
    })
}

/// Resolve the stored properties offset to the actual byte offset, applying
/// the version>=7 +1 adjustment. See `SPEC_FULL.md` §9 / open question 1.
pub fn resolve_modern_properties_offset(
    stored: i32,
    version: i32,
    adjustment: i32,
) -> i32 {
    if version >= 7 {
        log::debug!("applying cloud v7 offset adjustment of {adjustment}");
        stored + adjustment
    } else {
        stored
    }
}

/// The Modern cloud v7 ASA obelisk header variant. `spec.md` §4.6's third
/// bullet.
pub struct ModernCloudObeliskHeader {
    pub guid: Uuid,
    pub class_name: String,
    pub instance_name: String,
}

pub fn read_modern_cloud_obelisk_header(
    reader: &mut Reader,
    version: i32,
) -> Result<ModernCloudObeliskHeader> {
    let guid = reader.read_guid()?;
    let class_name = reader.read_string()?;
    let _unknown_a = reader.read_i32()?;
    let _unknown_b = reader.read_i32()?;
    let instance_name = reader.read_string()?;
    let padding = if version >= 7 { 21 } else { 20 };
    reader.read_bytes(padding)?;
    Ok(ModernCloudObeliskHeader {
        guid,
        class_name,
        instance_name,
    })
}

/// A Modern world-save object: parsed out of a `game` table row's blob
/// value. `spec.md` §4.6's fourth bullet.
pub struct ModernWorldSaveHeader {
    pub class_name: String,
    pub names: Vec<Name>,
    pub is_item: bool,
}

pub fn read_modern_world_save_header(
    reader: &mut Reader,
    name_table: &NameTable,
) -> Result<ModernWorldSaveHeader> {
    let class_name = name_table.read_name(reader)?.text;
    reader.read_bytes(4)?;
    let name_count = reader.read_i32()?;
    let mut names = Vec::with_capacity(name_count.max(0) as usize);
    for _ in 0..name_count.max(0) {
        names.push(Name::from_inline(&reader.read_string()?));
    }
    let _terminator = reader.read_i32()?;
    let marker = reader.read_u16()?;
    let is_item = marker == 1;
    Ok(ModernWorldSaveHeader {
        class_name,
        names,
        is_item,
    })
}

/// Decode the property sequence for an object already seeked to its
/// properties offset, returning the assembled object plus how many bytes
/// of trailing data (if any) remain unread within `expected_end`.
pub fn decode_properties(
    reader: &mut Reader,
    ctx: &PropertyContext,
) -> Result<Vec<Property>> {
    crate::properties::read_properties(reader, ctx)
}

/// Corrupt-header guard used by every file framer: an object count outside
/// this range cannot be real data. See `spec.md` §7.
pub const MAX_OBJECT_COUNT: i64 = 1_000_000;

pub fn check_object_count(count: i64) -> Result<()> {
    if count < 0 || count > MAX_OBJECT_COUNT {
        return Err(DecodeError::CorruptHeader(format!(
            "impossible object count {count}"
        )));
    }
    Ok(())
}
