//! Struct registry: dispatches a struct-type string to a native
//! fixed-layout reader or a generic property-list fallback. See
//! `spec.md` §4.4 and `structs/registry.py` in the reference
//! implementation.

use crate::context::PropertyContext;
use crate::error::Result;
use crate::framing::Framing;
use crate::properties::read_properties;
use crate::reader::Reader;
use crate::value::Property;
use serde::Serialize;
use uuid::Uuid;

/// One of the twelve struct types with a fixed binary layout, independent
/// of the generic property-list fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NativeStruct {
    Vector { x: f64, y: f64, z: f64 },
    Vector2D { x: f64, y: f64 },
    Rotator { pitch: f64, yaw: f64, roll: f64 },
    Quat { x: f64, y: f64, z: f64, w: f64 },
    IntPoint { x: i32, y: i32 },
    IntVector { x: i32, y: i32, z: i32 },
    /// Wire order is BGRA; fields here are named by channel, not wire
    /// position.
    Color { r: u8, g: u8, b: u8, a: u8 },
    LinearColor { r: f32, g: f32, b: f32, a: f32 },
    Guid(Uuid),
    UniqueNetIdRepl {
        unknown: u32,
        net_id: String,
        value_type: Option<String>,
    },
    CustomItemDataRef {
        value1: i32,
        value2: i32,
        value3: i32,
        value4: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StructValue {
    Native(NativeStruct),
    PropertyList {
        struct_type: String,
        properties: Vec<Property>,
    },
}

/// Array property names that imply a struct element type even when no
/// explicit type tag is present. See `SPEC_FULL.md` §3.
pub fn array_name_to_struct_type(array_name: &str) -> Option<&'static str> {
    match array_name {
        "CustomColors" => Some("Color"),
        "CustomColours_60_7D3267C846B277953C0C41AEBD54FBCB" => Some("LinearColor"),
        _ => None,
    }
}

pub fn is_native_struct(struct_type: &str) -> bool {
    matches!(
        struct_type,
        "Vector"
            | "Vector2D"
            | "Rotator"
            | "Quat"
            | "IntPoint"
            | "IntVector"
            | "Color"
            | "LinearColor"
            | "Guid"
            | "UniqueNetIdRepl"
            | "CustomItemDataRef"
    )
}

/// Read a struct whose type is already known (from a `StructProperty`
/// header or an array's declared element type). Unknown types fall back to
/// a property list read to the sentinel.
pub fn read_struct(reader: &mut Reader, struct_type: &str, ctx: &PropertyContext) -> Result<StructValue> {
    let framing = ctx.framing;
    match struct_type {
        "Vector" => {
            let (x, y, z) = read_vec3(reader, framing)?;
            Ok(StructValue::Native(NativeStruct::Vector { x, y, z }))
        }
        "Vector2D" => {
            let x = read_geom(reader, framing)?;
            let y = read_geom(reader, framing)?;
            Ok(StructValue::Native(NativeStruct::Vector2D { x, y }))
        }
        "Rotator" => {
            let (pitch, yaw, roll) = read_vec3(reader, framing)?;
            Ok(StructValue::Native(NativeStruct::Rotator {
                pitch,
                yaw,
                roll,
            }))
        }
        "Quat" => {
            // Float/double choice is keyed on worldsave-vs-not, not on
            // Legacy-vs-Modern like every other geometry field: Legacy and
            // Modern-string framing both store f32 (16 bytes total), only
            // world-save framing stores f64 (32 bytes).
            let (x, y, z, w) = if matches!(framing, Framing::ModernWorldSave) {
                (
                    reader.read_f64()?,
                    reader.read_f64()?,
                    reader.read_f64()?,
                    reader.read_f64()?,
                )
            } else {
                (
                    reader.read_f32()? as f64,
                    reader.read_f32()? as f64,
                    reader.read_f32()? as f64,
                    reader.read_f32()? as f64,
                )
            };
            Ok(StructValue::Native(NativeStruct::Quat { x, y, z, w }))
        }
        "IntPoint" => {
            let x = reader.read_i32()?;
            let y = reader.read_i32()?;
            Ok(StructValue::Native(NativeStruct::IntPoint { x, y }))
        }
        "IntVector" => {
            let x = reader.read_i32()?;
            let y = reader.read_i32()?;
            let z = reader.read_i32()?;
            Ok(StructValue::Native(NativeStruct::IntVector { x, y, z }))
        }
        "Color" => {
            // Wire order b,g,r,a.
            let b = reader.read_u8()?;
            let g = reader.read_u8()?;
            let r = reader.read_u8()?;
            let a = reader.read_u8()?;
            Ok(StructValue::Native(NativeStruct::Color { r, g, b, a }))
        }
        "LinearColor" => {
            let r = reader.read_f32()?;
            let g = reader.read_f32()?;
            let b = reader.read_f32()?;
            let a = reader.read_f32()?;
            Ok(StructValue::Native(NativeStruct::LinearColor { r, g, b, a }))
        }
        "Guid" => Ok(StructValue::Native(NativeStruct::Guid(reader.read_guid()?))),
        "UniqueNetIdRepl" => {
            if framing.is_modern() {
                let unknown = reader.read_u8()? as u32;
                let value_type = reader.read_string()?;
                let len = reader.read_u8()? as usize;
                let bytes = reader.read_bytes(len)?;
                let net_id = bytes.iter().map(|b| format!("{b:02x}")).collect();
                Ok(StructValue::Native(NativeStruct::UniqueNetIdRepl {
                    unknown,
                    net_id,
                    value_type: Some(value_type),
                }))
            } else {
                let unknown = reader.read_u32()?;
                let net_id = reader.read_string()?;
                Ok(StructValue::Native(NativeStruct::UniqueNetIdRepl {
                    unknown,
                    net_id,
                    value_type: None,
                }))
            }
        }
        "CustomItemDataRef" => Ok(StructValue::Native(NativeStruct::CustomItemDataRef {
            value1: reader.read_i32()?,
            value2: reader.read_i32()?,
            value3: reader.read_i32()?,
            value4: reader.read_i32()?,
        })),
        other => {
            log::warn!("unknown struct type '{other}', falling back to property list");
            let properties = read_properties(reader, ctx)?;
            Ok(StructValue::PropertyList {
                struct_type: other.to_string(),
                properties,
            })
        }
    }
}

/// Read a struct element inside an `ArrayProperty` whose own element
/// struct-type tag was absent; the array's property name is consulted
/// against `array_name_to_struct_type` first.
pub fn read_struct_for_array(
    reader: &mut Reader,
    array_name: &str,
    ctx: &PropertyContext,
) -> Result<StructValue> {
    match array_name_to_struct_type(array_name) {
        Some(struct_type) => read_struct(reader, struct_type, ctx),
        None => {
            let properties = read_properties(reader, ctx)?;
            Ok(StructValue::PropertyList {
                struct_type: "PropertyList".to_string(),
                properties,
            })
        }
    }
}

fn read_geom(reader: &mut Reader, framing: Framing) -> Result<f64> {
    if framing.is_legacy() {
        Ok(reader.read_f32()? as f64)
    } else {
        reader.read_f64()
    }
}

fn read_vec3(reader: &mut Reader, framing: Framing) -> Result<(f64, f64, f64)> {
    Ok((
        read_geom(reader, framing)?,
        read_geom(reader, framing)?,
        read_geom(reader, framing)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::NameTable;
    use crate::options::DecoderOptions;

    #[test]
    fn color_is_read_in_bgra_wire_order() {
        let data = [0x10u8, 0x20, 0x30, 0x40];
        let mut reader = Reader::new(&data);
        let table = NameTable::Inline;
        let opts = DecoderOptions::default();
        let ctx = PropertyContext::new(Framing::Legacy, &table, &opts);
        let value = read_struct(&mut reader, "Color", &ctx).unwrap();
        match value {
            StructValue::Native(NativeStruct::Color { r, g, b, a }) => {
                assert_eq!((r, g, b, a), (0x30, 0x20, 0x10, 0x40));
            }
            _ => panic!("expected native color"),
        }
    }

    #[test]
    fn vector_uses_f32_in_legacy_and_f64_in_modern() {
        let mut legacy_data = Vec::new();
        legacy_data.extend_from_slice(&1.0f32.to_le_bytes());
        legacy_data.extend_from_slice(&2.0f32.to_le_bytes());
        legacy_data.extend_from_slice(&3.0f32.to_le_bytes());
        let mut reader = Reader::new(&legacy_data);
        let table = NameTable::Inline;
        let opts = DecoderOptions::default();
        let ctx = PropertyContext::new(Framing::Legacy, &table, &opts);
        let value = read_struct(&mut reader, "Vector", &ctx).unwrap();
        assert_eq!(
            value,
            StructValue::Native(NativeStruct::Vector {
                x: 1.0,
                y: 2.0,
                z: 3.0
            })
        );
    }
}
