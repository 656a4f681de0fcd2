//! Attribute data types.
//!
//! The set is closed and mirrors the kernel's `NLA_*` policy types that the
//! codec understands. Labels are matched exactly; anything else resolves to
//! [`DataType::Unspecified`].

use std::fmt;

/// Semantic type of an attribute payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// Opaque bytes.
    #[default]
    Unspecified,
    U8,
    U16,
    U32,
    U64,
    /// Text, optionally NUL terminated inside the payload.
    String,
    Flag,
    Milliseconds,
    /// Payload is itself an attribute stream.
    Nested,
}

impl DataType {
    /// Every data type, in `NLA_*` numbering order.
    pub const ALL: [DataType; 9] = [
        DataType::Unspecified,
        DataType::U8,
        DataType::U16,
        DataType::U32,
        DataType::U64,
        DataType::String,
        DataType::Flag,
        DataType::Milliseconds,
        DataType::Nested,
    ];

    /// The wire label used in JSON documents.
    pub const fn label(self) -> &'static str {
        match self {
            DataType::Unspecified => "NLA_UNSPEC",
            DataType::U8 => "NLA_U8",
            DataType::U16 => "NLA_U16",
            DataType::U32 => "NLA_U32",
            DataType::U64 => "NLA_U64",
            DataType::String => "NLA_STRING",
            DataType::Flag => "NLA_FLAG",
            DataType::Milliseconds => "NLA_MSECS",
            DataType::Nested => "NLA_NESTED",
        }
    }

    /// Exact, case-sensitive label lookup.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dt| dt.label() == label)
    }

    /// Label lookup that falls back to [`DataType::Unspecified`].
    pub fn from_label(label: &str) -> Self {
        Self::parse(label).unwrap_or_default()
    }

    /// Payload width for types that have one.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            DataType::U8 => Some(1),
            DataType::U16 => Some(2),
            DataType::U32 | DataType::Flag | DataType::Milliseconds => Some(4),
            DataType::U64 => Some(8),
            DataType::Unspecified | DataType::String | DataType::Nested => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
