//! Cloud inventory file (uploaded/obelisk transfer, no file extension). See
//! `spec.md` §4.6-4.7.
//!
//! Shares profile/tribe's version + extra-header + object-count shape, with
//! one quirk: Modern v6 cloud files use Modern-style object headers but
//! Legacy-style property bodies. A second, structurally distinct header
//! (`ModernCloudObeliskHeader`) is also specified for one variant of this
//! file kind; the distillation gives no rule for when a given file uses it
//! instead of the standard Modern header, so it's exposed as a separate
//! entry point rather than guessed at automatically.

use crate::container::Container;
use crate::detect::{detect, Generation};
use crate::error::Result;
use crate::files::common::{read_extra_header_if_present, read_object_count, read_legacy_objects, read_modern_objects};
use crate::framing::Framing;
use crate::name::NameTable;
use crate::object::{self, GameObject};
use crate::options::DecoderOptions;
use crate::reader::Reader;
use std::path::Path;

#[derive(Debug)]
pub struct CloudFile {
    pub version: i32,
    pub generation: Generation,
    pub container: Container,
}

pub fn load_cloud(path: Option<&Path>, data: &[u8], opts: &DecoderOptions) -> Result<CloudFile> {
    let detection = detect(path, data)?;
    let mut reader = Reader::new(data);
    let version = reader.read_i32()?;
    read_extra_header_if_present(&mut reader, detection.generation, version)?;
    let count = read_object_count(&mut reader)?;

    let objects = match detection.generation {
        Generation::Legacy => {
            let name_table = NameTable::Inline;
            read_legacy_objects(&mut reader, count, &name_table, opts)?
        }
        Generation::Modern => {
            // v6 cloud: Modern header, Legacy-framed property bodies.
            let property_framing = if version == 6 {
                Framing::Legacy
            } else {
                Framing::ModernString
            };
            read_modern_objects(&mut reader, count, version, opts, property_framing, false)?
        }
    };

    Ok(CloudFile {
        version,
        generation: detection.generation,
        container: Container::new(objects),
    })
}

/// Alternate cloud loader for the obelisk header variant. Callers who know
/// their file uses this layout (rather than the standard Modern header)
/// should use this entry point instead of `load_cloud`.
pub fn load_cloud_obelisk(data: &[u8], version: i32, opts: &DecoderOptions) -> Result<CloudFile> {
    let mut reader = Reader::new(data);
    let file_version = reader.read_i32()?;
    read_extra_header_if_present(&mut reader, Generation::Modern, file_version)?;
    let count = read_object_count(&mut reader)?;

    let mut headers = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count.max(0) {
        headers.push(object::read_modern_cloud_obelisk_header(&mut reader, version)?);
    }

    let name_table = NameTable::Inline;
    let ctx = crate::context::PropertyContext::new(Framing::ModernString, &name_table, opts);
    let mut objects = Vec::with_capacity(headers.len());
    for header in headers {
        // Obelisk-variant properties follow the header sequentially; the
        // reader cursor is already positioned correctly after each header.
        // Unlike the other file kinds, no per-object offset is stored
        // upfront, so there is no way to bound this object's trailing
        // extra_data against the next one's start; it is left unset here.
        let properties_offset = reader.position() as i32;
        let properties = object::decode_properties(&mut reader, &ctx)?;
        objects.push(GameObject {
            id: None,
            guid: Some(header.guid),
            class_name: header.class_name,
            is_item: false,
            names: vec![crate::name::Name::from_inline(&header.instance_name)],
            from_data_file: false,
            data_file_index: 0,
            location: None,
            properties_offset,
            properties,
            extra_data: None,
            parent: None,
            components: Default::default(),
        });
    }

    Ok(CloudFile {
        version: file_version,
        generation: Generation::Modern,
        container: Container::new(objects),
    })
}
