//! The tagged data model: object references, properties, and the
//! `PropertyValue` sum type. See `spec.md` §3.

use crate::name::Name;
use crate::structs::StructValue;
use serde::Serialize;
use uuid::Uuid;

/// A reference to another game object, in one of the framings the format
/// uses depending on generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ObjectRef {
    Null,
    ById(i32),
    ByGuid(Uuid),
    ByName(Name),
}

/// Either a raw byte (tagged with the sentinel enum-type "None") or an
/// enum literal (enum-type name plus enum-value name).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ByteValue {
    Raw(u8),
    Enum { enum_type: String, enum_value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoftObjectRef {
    pub asset_path_name: String,
    pub sub_path_string: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayValue {
    pub element_type: String,
    pub elements: Vec<PropertyValue>,
}

/// Legacy-string `MapProperty` is under-exercised in the corpus and the
/// original source emits a placeholder rather than decoding entries; see
/// `SPEC_FULL.md` §9.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MapValue {
    Decoded {
        key_type: String,
        value_type: String,
        entries: Vec<(PropertyValue, PropertyValue)>,
    },
    Unsupported {
        key_type: String,
        value_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyValue {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    Str(String),
    NameRef(Name),
    ObjectRef(ObjectRef),
    SoftObjectRef(SoftObjectRef),
    Byte(ByteValue),
    Array(ArrayValue),
    Struct(StructValue),
    Map(MapValue),
}

/// A named, typed value attached to a game object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: Name,
    pub type_tag: String,
    pub array_index: i32,
    pub value: PropertyValue,
}
