//! Name interning: resolving a `(text, instance)` pair to a canonical string
//! across the three backends the format uses (dense list, sparse map,
//! inline).

use crate::reader::Reader;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A resolved `(text, instance)` pair. `instance == 0` is the common case;
/// `instance > 0` renders as `text_{instance-1}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Name {
    pub text: String,
    pub instance: i32,
}

impl Name {
    pub fn new(text: impl Into<String>, instance: i32) -> Self {
        Name {
            text: text.into(),
            instance,
        }
    }

    /// The "None" sentinel that terminates property lists and object
    /// name arrays.
    pub fn none() -> Self {
        Name::new("None", 0)
    }

    pub fn is_none(&self) -> bool {
        self.text == "None" && self.instance == 0
    }

    /// Split an inline string on a trailing `_D` suffix convention: `Foo_3`
    /// becomes `(Foo, 4)`; a string with no numeric suffix becomes
    /// `(whole, 0)`.
    pub fn from_inline(raw: &str) -> Self {
        if let Some(idx) = raw.rfind('_') {
            let (prefix, rest) = raw.split_at(idx);
            let digits = &rest[1..];
            if !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit())
                && digits.parse::<i32>().is_ok()
            {
                let d: i32 = digits.parse().unwrap();
                return Name::new(prefix, d + 1);
            }
        }
        Name::new(raw, 0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance == 0 {
            write!(f, "{}", self.text)
        } else {
            write!(f, "{}_{}", self.text, self.instance - 1)
        }
    }
}

/// The name-resolution backend in effect for a file. `Inline` covers Legacy
/// profile/tribe/cloud and Modern v6 profile/tribe (no table at all);
/// `Dense` covers Legacy world saves v>=6; `Sparse` covers Modern world
/// saves.
pub enum NameTable {
    Inline,
    Dense(Vec<String>),
    Sparse(IndexMap<i32, String>),
}

impl NameTable {
    /// Read one name from `reader` according to this table's backend.
    pub fn read_name(&self, reader: &mut Reader) -> crate::error::Result<Name> {
        match self {
            NameTable::Inline => {
                let raw = reader.read_string()?;
                Ok(Name::from_inline(&raw))
            }
            NameTable::Dense(list) => {
                let idx = reader.read_i32()?;
                let instance = reader.read_i32()?;
                let text = if idx >= 1 && (idx as usize) <= list.len() {
                    list[(idx - 1) as usize].clone()
                } else {
                    log::warn!("unknown dense name index {idx}");
                    format!("__UNKNOWN_NAME_INDEX_{idx}__")
                };
                Ok(Name::new(text, instance))
            }
            NameTable::Sparse(map) => {
                let key = reader.read_i32()?;
                let instance = reader.read_i32()?;
                let text = match map.get(&key) {
                    Some(t) => t.clone(),
                    None => {
                        log::warn!("unknown sparse name key {key}");
                        format!("__UNKNOWN_NAME_KEY_{key}__")
                    }
                };
                Ok(Name::new(text, instance))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_zero_renders_as_base_text() {
        let n = Name::new("Foo", 0);
        assert_eq!(n.to_string(), "Foo");
    }

    #[test]
    fn instance_nonzero_renders_with_suffix() {
        let n = Name::new("Foo", 4);
        assert_eq!(n.to_string(), "Foo_3");
    }

    #[test]
    fn inline_parse_then_format_is_idempotent() {
        for raw in ["Foo", "Foo_0", "Foo_3", "Foo_bar", "_5", "Weird__12"] {
            let n = Name::from_inline(raw);
            assert_eq!(n.to_string(), raw);
        }
    }

    #[test]
    fn dense_table_resolves_one_based_index() {
        let table = NameTable::Dense(vec!["Alpha".into(), "Beta".into()]);
        let data = [2i32.to_le_bytes(), 0i32.to_le_bytes()].concat();
        let mut r = Reader::new(&data);
        let name = table.read_name(&mut r).unwrap();
        assert_eq!(name.text, "Beta");
    }

    #[test]
    fn dense_table_out_of_bounds_is_placeholder_not_error() {
        let table = NameTable::Dense(vec!["Alpha".into()]);
        let data = [99i32.to_le_bytes(), 0i32.to_le_bytes()].concat();
        let mut r = Reader::new(&data);
        let name = table.read_name(&mut r).unwrap();
        assert!(name.text.contains("UNKNOWN"));
    }

    #[test]
    fn sparse_table_resolves_by_key() {
        let mut map = IndexMap::new();
        map.insert(42, "Hello".to_string());
        let table = NameTable::Sparse(map);
        let data = [42i32.to_le_bytes(), 0i32.to_le_bytes()].concat();
        let mut r = Reader::new(&data);
        let name = table.read_name(&mut r).unwrap();
        assert_eq!(name.text, "Hello");
    }
}
