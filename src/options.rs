/// Runtime configuration for a decode. Threaded explicitly through every
/// `load_*` entry point rather than held as global state.
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Added to a Modern cloud-inventory (v7+) object's stored
    /// `properties_offset` before seeking. Empirically `1`; see the open
    /// question in `SPEC_FULL.md` §9.
    pub cloud_v7_offset_adjustment: i32,

    /// Whether a non-zero byte found where the format expects zero padding
    /// is logged at `warn` level. Decoding always continues regardless.
    pub warn_on_unexpected_padding: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            cloud_v7_offset_adjustment: 1,
            warn_on_unexpected_padding: true,
        }
    }
}
