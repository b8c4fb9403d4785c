//! Legacy (ASE) binary world save. Grounded directly in `_parse_ase` and
//! its helpers in `files/world_save.py`. See `spec.md` §4.7.

use crate::container::Container;
use crate::context::PropertyContext;
use crate::error::{DecodeError, Result};
use crate::framing::Framing;
use crate::name::NameTable;
use crate::object::{self, check_object_count, GameObject};
use crate::options::DecoderOptions;
use crate::reader::Reader;
use indexmap::IndexMap;
use uuid::Uuid;

const VALID_VERSIONS: std::ops::RangeInclusive<i16> = 5..=12;

#[derive(Debug, Clone)]
pub struct EmbeddedData {
    pub path: String,
    pub data: Vec<Vec<Vec<u8>>>,
}

impl EmbeddedData {
    fn read(reader: &mut Reader) -> Result<Self> {
        let path = reader.read_string()?;
        let part_count = reader.read_i32()?.max(0);
        let mut data = Vec::with_capacity(part_count as usize);
        for _ in 0..part_count {
            let blob_count = reader.read_i32()?.max(0);
            let mut part = Vec::with_capacity(blob_count as usize);
            for _ in 0..blob_count {
                let blob_size = reader.read_i32()?.max(0) as usize * 4;
                part.push(reader.read_bytes(blob_size)?.to_vec());
            }
            data.push(part);
        }
        Ok(EmbeddedData { path, data })
    }
}

#[derive(Debug)]
pub struct LegacyWorldSave {
    pub version: i16,
    pub game_time: f32,
    pub save_count: i32,
    pub data_files: Vec<String>,
    pub embedded_data: Vec<EmbeddedData>,
    pub data_files_object_map: IndexMap<i32, Vec<Vec<String>>>,
    pub container: Container,
    pub parse_errors: Vec<(Uuid, String)>,
}

struct Header {
    version: i16,
    name_table_offset: i32,
    properties_block_offset: i32,
    game_time: f32,
    save_count: i32,
}

fn read_header(reader: &mut Reader) -> Result<Header> {
    let version = reader.read_i16()?;
    if !VALID_VERSIONS.contains(&version) {
        return Err(DecodeError::CorruptHeader(format!(
            "unsupported world save version {version}, expected 5..=12"
        )));
    }

    if version > 10 {
        for _ in 0..4 {
            reader.read_i64()?;
            reader.read_i64()?;
        }
    }

    if version > 6 {
        reader.read_i32()?; // hibernation offset
        reader.read_i32()?; // reserved, should be zero
    }

    let (name_table_offset, properties_block_offset) = if version > 5 {
        (reader.read_i32()?, reader.read_i32()?)
    } else {
        (0, 0)
    };

    let game_time = reader.read_f32()?;
    let save_count = if version > 8 { reader.read_i32()? } else { 0 };

    Ok(Header {
        version,
        name_table_offset,
        properties_block_offset,
        game_time,
        save_count,
    })
}

fn read_name_table(reader: &mut Reader, header: &Header) -> Result<Vec<String>> {
    if header.version <= 5 || header.name_table_offset <= 0 {
        return Ok(Vec::new());
    }
    let saved = reader.position();
    reader.set_position(header.name_table_offset.max(0) as usize)?;
    let count = reader.read_i32()?.max(0);
    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        names.push(reader.read_string()?);
    }
    reader.set_position(saved)?;
    Ok(names)
}

fn read_data_files(reader: &mut Reader) -> Result<Vec<String>> {
    let count = reader.read_i32()?.max(0);
    let mut files = Vec::with_capacity(count as usize);
    for _ in 0..count {
        files.push(reader.read_string()?);
    }
    Ok(files)
}

fn read_embedded_data(reader: &mut Reader) -> Result<Vec<EmbeddedData>> {
    let count = reader.read_i32()?.max(0);
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(EmbeddedData::read(reader)?);
    }
    Ok(out)
}

fn read_data_files_object_map(reader: &mut Reader) -> Result<IndexMap<i32, Vec<Vec<String>>>> {
    let count = reader.read_i32()?.max(0);
    let mut map = IndexMap::new();
    for _ in 0..count {
        let level = reader.read_i32()?;
        let name_count = reader.read_i32()?.max(0);
        let mut names = Vec::with_capacity(name_count as usize);
        for _ in 0..name_count {
            names.push(reader.read_string()?);
        }
        map.entry(level).or_insert_with(Vec::new).push(names);
    }
    Ok(map)
}

/// Whatever remains between the current reader position and the next
/// object's absolute properties offset is retained as this object's
/// `extra_data`. `None` for the last object, matching `game_object.py`'s
/// `load_properties` (only set when a `next_object` exists).
fn read_extra_data(reader: &mut Reader, next_absolute_offset: Option<i64>) -> Result<Option<Vec<u8>>> {
    let Some(next_offset) = next_absolute_offset else {
        return Ok(None);
    };
    let remaining = next_offset - reader.position() as i64;
    if remaining > 0 {
        Ok(Some(reader.read_bytes(remaining as usize)?.to_vec()))
    } else {
        Ok(None)
    }
}

pub fn load_world_legacy(data: &[u8], opts: &DecoderOptions) -> Result<LegacyWorldSave> {
    let mut reader = Reader::new(data);
    let header = read_header(&mut reader)?;
    let names = read_name_table(&mut reader, &header)?;
    let data_files = read_data_files(&mut reader)?;
    let embedded_data = read_embedded_data(&mut reader)?;
    let data_files_object_map = read_data_files_object_map(&mut reader)?;

    let name_table = if names.is_empty() {
        NameTable::Inline
    } else {
        NameTable::Dense(names)
    };

    let count = reader.read_i32()?;
    check_object_count(count as i64)?;
    let mut headers = Vec::with_capacity(count.max(0) as usize);
    for _ in 0..count.max(0) {
        headers.push(object::read_legacy_header(&mut reader, &name_table)?);
    }

    let ctx = PropertyContext::new(Framing::Legacy, &name_table, opts);
    let mut objects = Vec::with_capacity(headers.len());
    let mut parse_errors = Vec::new();
    for i in 0..headers.len() {
        let guid = headers[i].guid;
        let absolute_offset =
            header.properties_block_offset as i64 + headers[i].properties_offset as i64;
        let next_absolute_offset = headers
            .get(i + 1)
            .map(|h| header.properties_block_offset as i64 + h.properties_offset as i64);
        let (properties, extra_data) = match reader
            .set_position(absolute_offset.max(0) as usize)
            .and_then(|_| object::decode_properties(&mut reader, &ctx))
        {
            Ok(properties) => {
                let extra_data = match read_extra_data(&mut reader, next_absolute_offset) {
                    Ok(extra) => extra,
                    Err(err) => {
                        parse_errors.push((guid, err.to_string()));
                        None
                    }
                };
                (properties, extra_data)
            }
            Err(err) => {
                parse_errors.push((guid, err.to_string()));
                (Vec::new(), None)
            }
        };
        let legacy_header = &headers[i];
        objects.push(GameObject {
            id: None,
            guid: Some(guid),
            class_name: legacy_header.class_name.to_string(),
            is_item: legacy_header.is_item,
            names: legacy_header.names.clone(),
            from_data_file: legacy_header.from_data_file,
            data_file_index: legacy_header.data_file_index,
            location: legacy_header.location,
            properties_offset: legacy_header.properties_offset,
            properties,
            extra_data,
            parent: None,
            components: Default::default(),
        });
    }

    Ok(LegacyWorldSave {
        version: header.version,
        game_time: header.game_time,
        save_count: header.save_count,
        data_files,
        embedded_data,
        data_files_object_map,
        container: Container::new(objects),
        parse_errors,
    })
}
