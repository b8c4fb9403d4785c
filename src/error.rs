use thiserror::Error;

/// Decode-time failures. Only conditions the error taxonomy marks fatal are
/// represented here; "unknown struct type", "unknown name index" and
/// "unexpected padding" are recovered from in place and never surface as
/// `Err` (see `SPEC_FULL.md` §7).
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("end of data at position {position}: requested {requested} bytes, {available} available")]
    EndOfData {
        requested: usize,
        available: usize,
        position: usize,
    },

    #[error("unknown property type '{type_name}' at position {position}")]
    UnknownPropertyType { type_name: String, position: usize },

    #[error("corrupt header: {0}")]
    CorruptHeader(String),

    #[error("invalid utf-16 string data")]
    InvalidString,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
