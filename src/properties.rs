//! Property registry: reads a property header, then dispatches to one of
//! the value variants, each with up to three framing-specific encodings.
//! See `spec.md` §4.5 and `properties/registry.py` /
//! `properties/byte_property.py` in the reference implementation.

use crate::context::PropertyContext;
use crate::error::Result;
use crate::framing::Framing;
use crate::name::Name;
use crate::reader::{latin1_to_string, Reader};
use crate::structs::{is_native_struct, read_struct, read_struct_for_array};
use crate::value::{ArrayValue, ByteValue, MapValue, ObjectRef, Property, PropertyValue, SoftObjectRef};

/// Read a property list until the "None" sentinel, which is consumed but
/// never emitted as a property.
pub fn read_properties(reader: &mut Reader, ctx: &PropertyContext) -> Result<Vec<Property>> {
    let mut properties = Vec::new();
    while let Some(property) = read_one_property(reader, ctx)? {
        properties.push(property);
    }
    Ok(properties)
}

struct Header {
    name: Name,
    type_tag: String,
    array_index: i32,
    /// Byte length of the property's payload. Populated only for
    /// Legacy/Modern-string framing, where it is an explicit header field;
    /// `ModernWorldSave` framing carries data-size inside the per-variant
    /// payload instead (see `spec.md` §4.5 step 1).
    data_size: Option<i32>,
}

fn read_header(reader: &mut Reader, ctx: &PropertyContext) -> Result<Option<Header>> {
    let name = ctx.name_table.read_name(reader)?;
    if name.is_none() {
        return Ok(None);
    }
    let type_name = ctx.name_table.read_name(reader)?;
    match ctx.framing {
        Framing::Legacy | Framing::ModernString => {
            let data_size = reader.read_i32()?;
            let array_index = reader.read_i32()?;
            Ok(Some(Header {
                name,
                type_tag: type_name.text,
                array_index,
                data_size: Some(data_size),
            }))
        }
        Framing::ModernWorldSave => {
            let array_index = if name.instance > 0 { name.instance - 1 } else { 0 };
            Ok(Some(Header {
                name: Name::new(name.text, 0),
                type_tag: type_name.text,
                array_index,
                data_size: None,
            }))
        }
    }
}

fn read_one_property(reader: &mut Reader, ctx: &PropertyContext) -> Result<Option<Property>> {
    let header = match read_header(reader, ctx)? {
        Some(h) => h,
        None => return Ok(None),
    };
    let (value, index_override) = read_value(
        reader,
        &header.type_tag,
        ctx,
        header.data_size,
        header.array_index,
        &header.name,
    )?;
    let array_index = index_override.unwrap_or(header.array_index);
    Ok(Some(Property {
        name: header.name,
        type_tag: header.type_tag,
        array_index,
        value,
    }))
}

/// The optional flag-byte/zero-bytes prefix most property payloads carry in
/// Modern framings. `header_data_size` is `Some` only for Legacy/ModernString
/// framing, where it was already read as part of the common header.
struct Prefix {
    array_index_override: Option<i32>,
    flag_byte: u8,
}

fn read_prefix(reader: &mut Reader, ctx: &PropertyContext) -> Result<Prefix> {
    match ctx.framing {
        Framing::Legacy => Ok(Prefix {
            array_index_override: None,
            flag_byte: 0,
        }),
        Framing::ModernString => {
            let flag = reader.read_u8()?;
            let over = if flag & 1 != 0 {
                Some(reader.read_i32()?)
            } else {
                None
            };
            Ok(Prefix {
                array_index_override: over,
                flag_byte: flag,
            })
        }
        Framing::ModernWorldSave => {
            let zeros = reader.read_bytes(4)?;
            if ctx.opts.warn_on_unexpected_padding && zeros.iter().any(|&b| b != 0) {
                log::warn!("unexpected non-zero padding before property data-size");
            }
            let _inner_data_size = reader.read_i32()?;
            let flag = reader.read_u8()?;
            let over = if flag & 1 != 0 {
                Some(reader.read_i32()?)
            } else {
                None
            };
            Ok(Prefix {
                array_index_override: over,
                flag_byte: flag,
            })
        }
    }
}

fn read_value(
    reader: &mut Reader,
    type_tag: &str,
    ctx: &PropertyContext,
    header_data_size: Option<i32>,
    header_array_index: i32,
    property_name: &Name,
) -> Result<(PropertyValue, Option<i32>)> {
    match type_tag {
        "Int8Property" | "Int16Property" | "IntProperty" | "Int64Property" | "UInt16Property"
        | "UInt32Property" | "UInt64Property" | "FloatProperty" | "DoubleProperty" | "BoolProperty"
        | "StrProperty" | "NameProperty" => read_simple(reader, type_tag, ctx),
        "ObjectProperty" => read_object(reader, ctx, header_data_size),
        "SoftObjectProperty" => read_soft_object(reader, ctx),
        "ByteProperty" => read_byte(reader, ctx, header_array_index),
        "ArrayProperty" => read_array(reader, ctx, property_name),
        "StructProperty" => read_struct_property(reader, ctx),
        "MapProperty" => read_map(reader, ctx, header_data_size),
        other => {
            log::warn!("unknown property type '{other}' at {}", reader.position());
            Err(crate::error::DecodeError::UnknownPropertyType {
                type_name: other.to_string(),
                position: reader.position(),
            })
        }
    }
}

fn read_simple(
    reader: &mut Reader,
    type_tag: &str,
    ctx: &PropertyContext,
) -> Result<(PropertyValue, Option<i32>)> {
    let prefix = read_prefix(reader, ctx)?;
    let value = match type_tag {
        "Int8Property" => PropertyValue::Int8(reader.read_i8()?),
        "Int16Property" => PropertyValue::Int16(reader.read_i16()?),
        "IntProperty" => PropertyValue::Int32(reader.read_i32()?),
        "Int64Property" => PropertyValue::Int64(reader.read_i64()?),
        "UInt16Property" => PropertyValue::UInt16(reader.read_u16()?),
        "UInt32Property" => PropertyValue::UInt32(reader.read_u32()?),
        "UInt64Property" => PropertyValue::UInt64(reader.read_u64()?),
        "FloatProperty" => PropertyValue::Float32(reader.read_f32()?),
        "DoubleProperty" => PropertyValue::Float64(reader.read_f64()?),
        "BoolProperty" => {
            let b = match ctx.framing {
                Framing::Legacy => reader.read_bool_u8()?,
                Framing::ModernString | Framing::ModernWorldSave => prefix.flag_byte & 0x10 != 0,
            };
            PropertyValue::Bool(b)
        }
        "StrProperty" => PropertyValue::Str(reader.read_string()?),
        "NameProperty" => {
            let name = match ctx.framing {
                Framing::ModernWorldSave => ctx.name_table.read_name(reader)?,
                _ => Name::from_inline(&reader.read_string()?),
            };
            PropertyValue::NameRef(name)
        }
        _ => unreachable!("read_simple dispatched with non-simple type tag"),
    };
    Ok((value, prefix.array_index_override))
}

fn read_object(
    reader: &mut Reader,
    ctx: &PropertyContext,
    header_data_size: Option<i32>,
) -> Result<(PropertyValue, Option<i32>)> {
    match ctx.framing {
        Framing::Legacy => {
            let data_size = header_data_size.unwrap_or(0);
            let obj_ref = if data_size >= 8 {
                let tag = reader.read_i32()?;
                match tag {
                    0 => ObjectRef::ById(reader.read_i32()?),
                    1 => ObjectRef::ByName(ctx.name_table.read_name(reader)?),
                    _ => {
                        reader.skip(-4)?;
                        ObjectRef::ByName(ctx.name_table.read_name(reader)?)
                    }
                }
            } else if data_size == 4 {
                ObjectRef::ById(reader.read_i32()?)
            } else {
                ObjectRef::Null
            };
            Ok((PropertyValue::ObjectRef(obj_ref), None))
        }
        Framing::ModernString => {
            let flag = reader.read_u8()?;
            let over = if flag & 1 != 0 {
                Some(reader.read_i32()?)
            } else {
                None
            };
            let exists = reader.read_i32()?;
            let data_size = header_data_size.unwrap_or(0);
            let obj_ref = match exists {
                1 if data_size > 5 => ObjectRef::ByName(Name::new(reader.read_string()?, 0)),
                1 => ObjectRef::Null,
                -1 => ObjectRef::Null,
                0 => {
                    reader.read_i32()?;
                    ObjectRef::Null
                }
                other => {
                    log::warn!("unexpected ObjectProperty exists-flag {other}");
                    ObjectRef::Null
                }
            };
            Ok((PropertyValue::ObjectRef(obj_ref), over))
        }
        Framing::ModernWorldSave => {
            let prefix = read_prefix(reader, ctx)?;
            let marker = reader.read_u16()?;
            let obj_ref = if marker == 1 {
                ObjectRef::ByName(ctx.name_table.read_name(reader)?)
            } else {
                let guid = reader.read_guid()?;
                if guid.is_nil() {
                    ObjectRef::Null
                } else {
                    ObjectRef::ByGuid(guid)
                }
            };
            Ok((PropertyValue::ObjectRef(obj_ref), prefix.array_index_override))
        }
    }
}

fn read_soft_object(reader: &mut Reader, ctx: &PropertyContext) -> Result<(PropertyValue, Option<i32>)> {
    match ctx.framing {
        Framing::Legacy => {
            let asset_path_name = reader.read_string()?;
            let sub_path_string = reader.read_string()?;
            Ok((
                PropertyValue::SoftObjectRef(SoftObjectRef {
                    asset_path_name,
                    sub_path_string,
                }),
                None,
            ))
        }
        Framing::ModernString => {
            let prefix = read_prefix(reader, ctx)?;
            let asset_path_name = reader.read_string()?;
            let sub_path_string = reader.read_string()?;
            Ok((
                PropertyValue::SoftObjectRef(SoftObjectRef {
                    asset_path_name,
                    sub_path_string,
                }),
                prefix.array_index_override,
            ))
        }
        Framing::ModernWorldSave => {
            let prefix = read_prefix(reader, ctx)?;
            let name = ctx.name_table.read_name(reader)?;
            Ok((
                PropertyValue::SoftObjectRef(SoftObjectRef {
                    asset_path_name: name.to_string(),
                    sub_path_string: String::new(),
                }),
                prefix.array_index_override,
            ))
        }
    }
}

fn read_byte(
    reader: &mut Reader,
    ctx: &PropertyContext,
    header_array_index: i32,
) -> Result<(PropertyValue, Option<i32>)> {
    match ctx.framing {
        Framing::Legacy => {
            let enum_type = ctx.name_table.read_name(reader)?;
            if enum_type.is_none() {
                Ok((PropertyValue::Byte(ByteValue::Raw(reader.read_u8()?)), None))
            } else {
                let enum_value = ctx.name_table.read_name(reader)?;
                Ok((
                    PropertyValue::Byte(ByteValue::Enum {
                        enum_type: enum_type.text,
                        enum_value: enum_value.to_string(),
                    }),
                    None,
                ))
            }
        }
        Framing::ModernString => {
            // The common header's array-index field is repurposed to carry
            // the enum-type-name length for this property type.
            let enum_type_name_len = header_array_index;
            if enum_type_name_len <= 1 {
                let flag = reader.read_u8()?;
                let over = if flag & 1 != 0 {
                    Some(reader.read_i32()?)
                } else {
                    None
                };
                let byte_value = reader.read_u8()?;
                Ok((PropertyValue::Byte(ByteValue::Raw(byte_value)), over))
            } else {
                let raw = reader.read_bytes(enum_type_name_len.max(0) as usize)?;
                let enum_type = latin1_to_string(raw.strip_suffix(&[0u8]).unwrap_or(raw));
                let _script_path = reader.read_string()?;
                let _zeros = reader.read_bytes(8)?;
                let _data_size = reader.read_i32()?;
                let flag = reader.read_u8()?;
                let over = if flag & 1 != 0 {
                    Some(reader.read_i32()?)
                } else {
                    None
                };
                let enum_value = reader.read_string()?;
                Ok((
                    PropertyValue::Byte(ByteValue::Enum {
                        enum_type,
                        enum_value,
                    }),
                    over,
                ))
            }
        }
        Framing::ModernWorldSave => {
            let discriminator = reader.read_i32()?;
            if discriminator == 0 {
                let prefix = read_prefix(reader, ctx)?;
                let byte_value = reader.read_u8()?;
                Ok((
                    PropertyValue::Byte(ByteValue::Raw(byte_value)),
                    prefix.array_index_override,
                ))
            } else {
                let enum_type = ctx.name_table.read_name(reader)?;
                let _marker = reader.read_i32()?;
                let _blueprint = ctx.name_table.read_name(reader)?;
                let _zeros = reader.read_i32()?;
                let _data_size = reader.read_i32()?;
                let flag = reader.read_u8()?;
                let over = if flag & 1 != 0 {
                    Some(reader.read_i32()?)
                } else {
                    None
                };
                let enum_value = ctx.name_table.read_name(reader)?;
                Ok((
                    PropertyValue::Byte(ByteValue::Enum {
                        enum_type: enum_type.text,
                        enum_value: enum_value.to_string(),
                    }),
                    over,
                ))
            }
        }
    }
}

/// Consume `(group_count - 1)` 12-byte extra name-reference groups when a
/// struct header discriminator exceeds 1. The purpose of these groups is
/// unclear upstream; this preserves the observed behavior without
/// interpreting the bytes.
fn skip_extra_name_ref_groups(reader: &mut Reader, group_count: i32) -> Result<()> {
    if group_count > 1 {
        for _ in 1..group_count {
            reader.read_bytes(12)?;
        }
    }
    Ok(())
}

fn read_array(
    reader: &mut Reader,
    ctx: &PropertyContext,
    property_name: &Name,
) -> Result<(PropertyValue, Option<i32>)> {
    let prefix = read_prefix(reader, ctx)?;
    let element_type = ctx.name_table.read_name(reader)?.text;

    if element_type == "StructProperty" {
        let discriminator = reader.read_i32()?;
        let struct_type = ctx.name_table.read_name(reader)?.text;
        let _script_path = ctx.name_table.read_name(reader)?;
        skip_extra_name_ref_groups(reader, discriminator)?;
        let _padding = reader.read_bytes(4)?;
        let _byte_length = reader.read_i32()?;
        let _flag = reader.read_u8()?;
        let count = reader.read_i32()?.max(0) as usize;

        let mut elements = Vec::with_capacity(count);
        let padding_between = prefix.flag_byte & 0x08 != 0;
        for i in 0..count {
            let element = if is_native_struct(&struct_type) {
                read_struct(reader, &struct_type, ctx)?
            } else {
                let properties = crate::properties::read_properties(reader, ctx)?;
                crate::structs::StructValue::PropertyList {
                    struct_type: struct_type.clone(),
                    properties,
                }
            };
            elements.push(PropertyValue::Struct(element));
            if padding_between && i + 1 < count {
                reader.read_bytes(4)?;
            }
        }
        Ok((
            PropertyValue::Array(ArrayValue {
                element_type,
                elements,
            }),
            prefix.array_index_override,
        ))
    } else {
        let count = reader.read_i32()?.max(0) as usize;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            elements.push(read_raw_element(reader, &element_type, ctx, property_name)?);
        }
        Ok((
            PropertyValue::Array(ArrayValue {
                element_type,
                elements,
            }),
            prefix.array_index_override,
        ))
    }
}

/// Read one array or map element with no per-element header — just the
/// raw value for the declared type tag.
fn read_raw_element(
    reader: &mut Reader,
    type_tag: &str,
    ctx: &PropertyContext,
    property_name: &Name,
) -> Result<PropertyValue> {
    match type_tag {
        "Int8Property" => Ok(PropertyValue::Int8(reader.read_i8()?)),
        "Int16Property" => Ok(PropertyValue::Int16(reader.read_i16()?)),
        "IntProperty" => Ok(PropertyValue::Int32(reader.read_i32()?)),
        "Int64Property" => Ok(PropertyValue::Int64(reader.read_i64()?)),
        "UInt16Property" => Ok(PropertyValue::UInt16(reader.read_u16()?)),
        "UInt32Property" => Ok(PropertyValue::UInt32(reader.read_u32()?)),
        "UInt64Property" => Ok(PropertyValue::UInt64(reader.read_u64()?)),
        "FloatProperty" => Ok(PropertyValue::Float32(reader.read_f32()?)),
        "DoubleProperty" => Ok(PropertyValue::Float64(reader.read_f64()?)),
        "BoolProperty" => Ok(PropertyValue::Bool(reader.read_bool_u8()?)),
        "StrProperty" => Ok(PropertyValue::Str(reader.read_string()?)),
        "NameProperty" => Ok(PropertyValue::NameRef(ctx.name_table.read_name(reader)?)),
        "ObjectProperty" => Ok(PropertyValue::ObjectRef(ObjectRef::ById(reader.read_i32()?))),
        "ByteProperty" => Ok(PropertyValue::Byte(ByteValue::Raw(reader.read_u8()?))),
        "StructProperty" => {
            let struct_type = array_element_struct_type(property_name);
            Ok(PropertyValue::Struct(read_struct_for_array(
                reader,
                &struct_type,
                ctx,
            )?))
        }
        other => {
            log::warn!("array element type '{other}' has no raw reader, treating as bytes stub");
            Ok(PropertyValue::Byte(ByteValue::Raw(reader.read_u8()?)))
        }
    }
}

fn array_element_struct_type(property_name: &Name) -> String {
    property_name.text.clone()
}

fn read_struct_property(reader: &mut Reader, ctx: &PropertyContext) -> Result<(PropertyValue, Option<i32>)> {
    match ctx.framing {
        Framing::Legacy | Framing::ModernString => {
            let struct_type = ctx.name_table.read_name(reader)?.text;
            if ctx.v6_struct_list_padding && !is_native_struct(&struct_type) {
                reader.read_bytes(17)?;
            }
            let value = read_struct(reader, &struct_type, ctx)?;
            Ok((PropertyValue::Struct(value), None))
        }
        Framing::ModernWorldSave => {
            let struct_type = ctx.name_table.read_name(reader)?.text;
            let _script_path = ctx.name_table.read_name(reader)?;
            let group_count = reader.read_i32()?;
            skip_extra_name_ref_groups(reader, group_count)?;
            let _data_size = reader.read_i32()?;
            let flag = reader.read_u8()?;
            let over = if flag & 1 != 0 {
                Some(reader.read_i32()?)
            } else {
                None
            };
            let value = read_struct(reader, &struct_type, ctx)?;
            Ok((PropertyValue::Struct(value), over))
        }
    }
}

fn read_map(
    reader: &mut Reader,
    ctx: &PropertyContext,
    header_data_size: Option<i32>,
) -> Result<(PropertyValue, Option<i32>)> {
    match ctx.framing {
        Framing::Legacy | Framing::ModernString => {
            // Under-exercised in the corpus; the reference implementation
            // itself emits a placeholder rather than decoding entries. We
            // still need to leave the cursor in the right place, which the
            // explicit header data-size lets us do without understanding
            // the payload.
            let key_type = ctx.name_table.read_name(reader)?.text;
            let value_type = ctx.name_table.read_name(reader)?.text;
            let value_start = reader.position();
            if let Some(data_size) = header_data_size {
                reader.set_position(value_start + data_size.max(0) as usize)?;
            }
            Ok((
                PropertyValue::Map(MapValue::Unsupported { key_type, value_type }),
                None,
            ))
        }
        Framing::ModernWorldSave => {
            let marker = reader.read_i32()?;
            if marker != 2 {
                log::warn!("unexpected MapProperty marker {marker}, expected 2");
            }
            let key_type = ctx.name_table.read_name(reader)?.text;
            let value_type = ctx.name_table.read_name(reader)?.text;
            let _flag = reader.read_u8()?;

            let value_struct_type = if value_type == "StructProperty" {
                let vst = ctx.name_table.read_name(reader)?.text;
                let _script_path = ctx.name_table.read_name(reader)?;
                let group_count = reader.read_i32()?;
                skip_extra_name_ref_groups(reader, group_count)?;
                let _data_size = reader.read_i32()?;
                Some(vst)
            } else {
                None
            };

            let count = reader.read_i32()?.max(0) as usize;
            let mut entries = Vec::with_capacity(count);
            let dummy_name = Name::new(String::new(), 0);
            for _ in 0..count {
                let key = read_raw_element(reader, &key_type, ctx, &dummy_name)?;
                let value = if let Some(vst) = &value_struct_type {
                    let properties = read_properties(reader, ctx)?;
                    PropertyValue::Struct(crate::structs::StructValue::PropertyList {
                        struct_type: vst.clone(),
                        properties,
                    })
                } else {
                    read_raw_element(reader, &value_type, ctx, &dummy_name)?
                };
                entries.push((key, value));
            }
            Ok((
                PropertyValue::Map(MapValue::Decoded {
                    key_type,
                    value_type,
                    entries,
                }),
                None,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::NameTable;
    use crate::options::DecoderOptions;

    fn inline_ctx(opts: &DecoderOptions, table: &NameTable) -> PropertyContext<'_> {
        PropertyContext::new(Framing::Legacy, table, opts)
    }

    fn push_string(buf: &mut Vec<u8>, s: &str) {
        let bytes = s.as_bytes();
        let len = (bytes.len() + 1) as i32;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(bytes);
        buf.push(0);
    }

    #[test]
    fn sentinel_terminates_property_list_without_emitting_it() {
        let mut data = Vec::new();
        push_string(&mut data, "Health");
        push_string(&mut data, "FloatProperty");
        data.extend_from_slice(&4i32.to_le_bytes()); // data_size
        data.extend_from_slice(&0i32.to_le_bytes()); // array_index
        data.extend_from_slice(&100.0f32.to_le_bytes());
        push_string(&mut data, "None");
        let tail_marker = data.len();
        data.extend_from_slice(b"TAIL");

        let table = NameTable::Inline;
        let opts = DecoderOptions::default();
        let ctx = inline_ctx(&opts, &table);
        let mut reader = Reader::new(&data);
        let props = read_properties(&mut reader, &ctx).unwrap();

        assert_eq!(props.len(), 1);
        assert_eq!(props[0].name.text, "Health");
        assert!(!props.iter().any(|p| p.name.text == "None"));
        assert_eq!(reader.position(), tail_marker);
    }

    #[test]
    fn legacy_int_property_reads_raw_value() {
        let mut data = Vec::new();
        push_string(&mut data, "Level");
        push_string(&mut data, "IntProperty");
        data.extend_from_slice(&4i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&42i32.to_le_bytes());
        push_string(&mut data, "None");

        let table = NameTable::Inline;
        let opts = DecoderOptions::default();
        let ctx = inline_ctx(&opts, &table);
        let mut reader = Reader::new(&data);
        let props = read_properties(&mut reader, &ctx).unwrap();
        assert_eq!(props[0].value, PropertyValue::Int32(42));
    }

    #[test]
    fn modern_world_save_bool_flag_byte_bits() {
        // bit0 = has_index, bit4 = value
        for (flag, expect_index, expect_value) in [(0x00u8, false, false), (0x01, true, false), (0x10, false, true), (0x11, true, true)] {
            let mut data = Vec::new();
            data.extend_from_slice(&0i32.to_le_bytes()); // name key
            data.extend_from_slice(&0i32.to_le_bytes()); // name instance
            data.extend_from_slice(&1i32.to_le_bytes()); // type key -> "BoolProperty"
            data.extend_from_slice(&0i32.to_le_bytes());
            data.extend_from_slice(&[0u8; 4]); // zero prefix
            data.extend_from_slice(&0i32.to_le_bytes()); // inner data size
            data.push(flag);
            if expect_index {
                data.extend_from_slice(&7i32.to_le_bytes());
            }
            // sentinel: key 2 resolves to "None"
            data.extend_from_slice(&2i32.to_le_bytes());
            data.extend_from_slice(&0i32.to_le_bytes());

            let mut map = indexmap::IndexMap::new();
            map.insert(0, "MyBool".to_string());
            map.insert(1, "BoolProperty".to_string());
            map.insert(2, "None".to_string());
            let table = NameTable::Sparse(map);
            let opts = DecoderOptions::default();
            let ctx = PropertyContext::new(Framing::ModernWorldSave, &table, &opts);
            let mut reader = Reader::new(&data);
            let props = read_properties(&mut reader, &ctx).unwrap();
            assert_eq!(props[0].value, PropertyValue::Bool(expect_value));
            if expect_index {
                assert_eq!(props[0].array_index, 7);
            }
        }
    }
}
