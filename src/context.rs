//! Bundles the handful of things every property/struct reader needs so
//! deep call chains don't pass four or five arguments around individually.

use crate::framing::Framing;
use crate::name::NameTable;
use crate::options::DecoderOptions;

pub struct PropertyContext<'a> {
    pub framing: Framing,
    pub name_table: &'a NameTable,
    pub opts: &'a DecoderOptions,
    /// Modern v6 profile/tribe precedes property-list struct bodies with a
    /// 17-byte zero padding block; native structs skip it. Always `false`
    /// outside that one file-kind/version combination.
    pub v6_struct_list_padding: bool,
}

impl<'a> PropertyContext<'a> {
    pub fn new(framing: Framing, name_table: &'a NameTable, opts: &'a DecoderOptions) -> Self {
        PropertyContext {
            framing,
            name_table,
            opts,
            v6_struct_list_padding: false,
        }
    }

    pub fn with_v6_struct_padding(mut self, on: bool) -> Self {
        self.v6_struct_list_padding = on;
        self
    }
}
