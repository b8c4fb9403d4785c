//! Shared framing logic for the profile/tribe/cloud file kinds: version,
//! optional extra header, object count, headers-then-bodies layout. See
//! `spec.md` §4.7.

use crate::context::PropertyContext;
use crate::detect::Generation;
use crate::error::Result;
use crate::name::NameTable;
use crate::object::{self, check_object_count, GameObject, LegacyHeader, ModernHeader};
use crate::options::DecoderOptions;
use crate::reader::Reader;

pub fn read_version(reader: &mut Reader) -> Result<i32> {
    reader.read_i32()
}

/// Modern v>=7 profile/tribe/cloud carries an extra two-i32 header whose
/// fields aren't otherwise used by the decoder.
pub fn read_extra_header_if_present(reader: &mut Reader, generation: Generation, version: i32) -> Result<()> {
    if generation == Generation::Modern && version >= 7 {
        reader.read_i32()?;
        reader.read_i32()?;
    }
    Ok(())
}

pub fn read_object_count(reader: &mut Reader) -> Result<i32> {
    let count = reader.read_i32()?;
    check_object_count(count as i64)?;
    Ok(count)
}

/// Read `count` Legacy-framing object headers (sequential), then seek to
/// each one's properties offset and decode its property list. Headers and
/// bodies are two separate blocks; `properties_offset` is absolute.
pub fn read_legacy_objects(
    reader: &mut Reader,
    count: i32,
    name_table: &NameTable,
    opts: &DecoderOptions,
) -> Result<Vec<GameObject>> {
    let mut headers = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count.max(0) {
        headers.push(object::read_legacy_header(reader, name_table)?);
    }

    let ctx = PropertyContext::new(crate::framing::Framing::Legacy, name_table, opts);
    let mut objects = Vec::with_capacity(headers.len());
    for i in 0..headers.len() {
        let next_offset = headers.get(i + 1).map(|h| h.properties_offset);
        objects.push(assemble_legacy(reader, &headers[i], next_offset, &ctx)?);
    }
    Ok(objects)
}

fn assemble_legacy(
    reader: &mut Reader,
    header: &LegacyHeader,
    next_properties_offset: Option<i32>,
    ctx: &PropertyContext,
) -> Result<GameObject> {
    reader.set_position(header.properties_offset.max(0) as usize)?;
    let properties = object::decode_properties(reader, ctx)?;
    let extra_data = read_extra_data(reader, next_properties_offset)?;
    Ok(GameObject {
        id: None,
        guid: Some(header.guid),
        class_name: header.class_name.to_string(),
        is_item: header.is_item,
        names: header.names.clone(),
        from_data_file: header.from_data_file,
        data_file_index: header.data_file_index,
        location: header.location,
        properties_offset: header.properties_offset,
        properties,
        extra_data,
        parent: None,
        components: Default::default(),
    })
}

/// Whatever remains between the current reader position and the next
/// object's properties offset is retained as this object's `extra_data`.
/// `None` for the last object in a file, matching `game_object.py`'s
/// `load_properties` (only set when a `next_object` exists).
fn read_extra_data(reader: &mut Reader, next_properties_offset: Option<i32>) -> Result<Option<Vec<u8>>> {
    let Some(next_offset) = next_properties_offset else {
        return Ok(None);
    };
    let remaining = next_offset as i64 - reader.position() as i64;
    if remaining > 0 {
        Ok(Some(reader.read_bytes(remaining as usize)?.to_vec()))
    } else {
        Ok(None)
    }
}

/// Read `count` Modern non-world-save object headers, then seek to each
/// one's resolved properties offset and decode its property list.
/// `property_framing` lets cloud v6 use Legacy-style property bodies under
/// a Modern-style header, per `spec.md` §4.7. `v6_struct_padding` enables
/// the mandatory 17-byte zero-padding block before non-native
/// struct-property-list bodies, which only Modern v6 profile/tribe files
/// carry (`spec.md` line 171) — callers outside that file-kind/version
/// combination must pass `false`.
pub fn read_modern_objects(
    reader: &mut Reader,
    count: i32,
    version: i32,
    opts: &DecoderOptions,
    property_framing: crate::framing::Framing,
    v6_struct_padding: bool,
) -> Result<Vec<GameObject>> {
    let mut headers = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count.max(0) {
        headers.push(object::read_modern_header(reader, version)?);
    }

    let name_table = NameTable::Inline;
    let ctx = PropertyContext::new(property_framing, &name_table, opts)
        .with_v6_struct_padding(v6_struct_padding);
    let resolved_offsets: Vec<i32> = headers
        .iter()
        .map(|h| {
            object::resolve_modern_properties_offset(
                h.stored_properties_offset,
                version,
                opts.cloud_v7_offset_adjustment,
            )
        })
        .collect();
    let mut objects = Vec::with_capacity(headers.len());
    for (i, header) in headers.into_iter().enumerate() {
        let next_offset = resolved_offsets.get(i + 1).copied();
        objects.push(assemble_modern(reader, header, resolved_offsets[i], next_offset, &ctx)?);
    }
    Ok(objects)
}

fn assemble_modern(
    reader: &mut Reader,
    header: ModernHeader,
    offset: i32,
    next_properties_offset: Option<i32>,
    ctx: &PropertyContext,
) -> Result<GameObject> {
    reader.set_position(offset.max(0) as usize)?;
    let properties = object::decode_properties(reader, ctx)?;
    let extra_data = read_extra_data(reader, next_properties_offset)?;
    Ok(GameObject {
        id: None,
        guid: Some(header.guid),
        class_name: header.class_name,
        is_item: false,
        names: header.names,
        from_data_file: false,
        data_file_index: 0,
        location: None,
        properties_offset: offset,
        properties,
        extra_data,
        parent: None,
        components: Default::default(),
    })
}
