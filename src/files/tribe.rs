//! Tribe data file (`.arktribe`). Shares its framing with profile files; see
//! `spec.md` §4.7.

use crate::container::Container;
use crate::detect::{detect, Generation};
use crate::error::Result;
use crate::files::common::{read_extra_header_if_present, read_object_count, read_legacy_objects, read_modern_objects};
use crate::framing::Framing;
use crate::name::NameTable;
use crate::options::DecoderOptions;
use crate::reader::Reader;
use std::path::Path;

#[derive(Debug)]
pub struct TribeFile {
    pub version: i32,
    pub generation: Generation,
    pub container: Container,
}

pub fn load_tribe(path: Option<&Path>, data: &[u8], opts: &DecoderOptions) -> Result<TribeFile> {
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
            read_modern_objects(
                &mut reader,
                count,
                version,
                opts,
                Framing::ModernString,
                version == 6,
            )?
        }
    };

    Ok(TribeFile {
        version,
        generation: detection.generation,
        container: Container::new(objects),
    })
}
