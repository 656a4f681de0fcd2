/// Behavior flags fixed when a [`crate::Handle`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecConfig {
    /// When true, the encoder drops records that have no policy entry.
    pub skip_unknown_attrs: bool,
    /// When true, encoder output starts with a `"timestamp"` member.
    pub add_timestamp: bool,
    /// When true, JSON output is indented instead of compact.
    pub pretty: bool,
}
