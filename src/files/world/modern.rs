//! Modern (ASA) SQLite world save. Grounded in `_parse_asa` and its helpers
//! in `files/world_save.py`. See `spec.md` §4.7.

use crate::container::Container;
use crate::context::PropertyContext;
use crate::error::Result;
use crate::framing::Framing;
use crate::name::NameTable;
use crate::object::{self, GameObject, Location};
use crate::options::DecoderOptions;
use crate::reader::Reader;
use indexmap::IndexMap;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug)]
pub struct ModernWorldSave {
    pub version: i16,
    pub game_time: f64,
    pub data_files: Vec<String>,
    pub container: Container,
    pub parse_errors: Vec<(Uuid, String)>,
}

struct SaveHeader {
    version: i16,
    game_time: f64,
    data_files: Vec<String>,
    name_table: IndexMap<i32, String>,
}

fn read_save_header(blob: &[u8]) -> Result<SaveHeader> {
    let mut reader = Reader::new(blob);
    let version = reader.read_i16()?;
    reader.read_i32()?; // legacy offset
    reader.read_i32()?; // unknown
    reader.read_i32()?; // actual offset
    let game_time = reader.read_f64()?;
    reader.read_i32()?; // unknown

    let data_file_count = reader.read_i32()?.max(0);
    let mut data_files = Vec::with_capacity(data_file_count as usize);
    for _ in 0..data_file_count {
        data_files.push(reader.read_string()?);
        reader.read_i32()?; // per-entry terminator
    }

    reader.read_i32()?;
    reader.read_i32()?;

    let name_count = reader.read_i32()?.max(0);
    let mut name_table = IndexMap::new();
    for _ in 0..name_count {
        let idx = reader.read_i32()?;
        let raw = reader.read_string()?;
        let short = match raw.rsplit_once('.') {
            Some((_, tail)) => tail.to_string(),
            None => raw,
        };
        name_table.insert(idx, short);
    }

    Ok(SaveHeader {
        version,
        game_time,
        data_files,
        name_table,
    })
}

fn read_actor_transforms(blob: &[u8]) -> Result<HashMap<Uuid, Location>> {
    let mut reader = Reader::new(blob);
    let mut locations = HashMap::new();
    while reader.remaining() >= 16 {
        let guid_bytes = reader.read_bytes(16)?;
        if guid_bytes.iter().all(|&b| b == 0) {
            break;
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(guid_bytes);
        let guid = Uuid::from_bytes_le(arr);
        let location = Location {
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            z: reader.read_f64()?,
            pitch: reader.read_f64()?,
            yaw: reader.read_f64()?,
            roll: reader.read_f64()?,
        };
        reader.read_bytes(8)?; // padding
        locations.insert(guid, location);
    }
    Ok(locations)
}

pub fn load_world_modern(path: &Path, opts: &DecoderOptions) -> Result<ModernWorldSave> {
    let conn = Connection::open(path)?;

    let header_blob: Vec<u8> =
        conn.query_row("SELECT value FROM custom WHERE key = 'SaveHeader'", [], |row| row.get(0))?;
    let header = read_save_header(&header_blob)?;

    let transforms = match conn.query_row(
        "SELECT value FROM custom WHERE key = 'ActorTransforms'",
        [],
        |row| row.get::<_, Vec<u8>>(0),
    ) {
        Ok(blob) => read_actor_transforms(&blob)?,
        Err(rusqlite::Error::QueryReturnedNoRows) => HashMap::new(),
        Err(e) => return Err(e.into()),
    };

    let name_table = NameTable::Sparse(header.name_table.clone());
    let ctx = PropertyContext::new(Framing::ModernWorldSave, &name_table, opts);

    let mut stmt = conn.prepare("SELECT key, value FROM game")?;
    let mut rows = stmt.query([])?;

    let mut objects = Vec::new();
    let mut parse_errors = Vec::new();
    while let Some(row) = rows.next()? {
        let key: Vec<u8> = row.get(0)?;
        let value: Vec<u8> = row.get(1)?;
        let mut arr = [0u8; 16];
        if key.len() != 16 {
            continue;
        }
        arr.copy_from_slice(&key);
        let guid = Uuid::from_bytes_le(arr);

        match parse_object(&value, &name_table, &ctx) {
            Ok(mut object) => {
                object.guid = Some(guid);
                if let Some(location) = transforms.get(&guid) {
                    object.location = Some(*location);
                }
                objects.push(object);
            }
            Err(err) => parse_errors.push((guid, err.to_string())),
        }
    }

    Ok(ModernWorldSave {
        version: header.version,
        game_time: header.game_time,
        data_files: header.data_files,
        container: Container::new(objects),
        parse_errors,
    })
}

fn parse_object(blob: &[u8], name_table: &NameTable, ctx: &PropertyContext) -> Result<GameObject> {
    let mut reader = Reader::new(blob);
    let parsed = object::read_modern_world_save_header(&mut reader, name_table)?;
    let properties_offset = reader.position() as i32;
    let properties = object::decode_properties(&mut reader, ctx)?;
    let extra_data = if reader.remaining() > 0 {
        Some(reader.read_bytes(reader.remaining())?.to_vec())
    } else {
        None
    };
    Ok(GameObject {
        id: None,
        guid: None,
        class_name: parsed.class_name,
        is_item: parsed.is_item,
        names: parsed.names,
        from_data_file: false,
        data_file_index: 0,
        location: None,
        properties_offset,
        properties,
        extra_data,
        parent: None,
        components: Default::default(),
    })
}
