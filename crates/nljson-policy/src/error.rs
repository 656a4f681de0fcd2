/// Errors that can occur while compiling an attribute policy.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The policy source could not be read.
    #[error("failed to load policy: {0}")]
    LoadFailed(String),

    /// The policy source is not valid JSON.
    #[error("policy is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A policy (or nested policy) is not a JSON object.
    #[error("policy {path:?} is not a JSON object")]
    NotAnObject { path: String },

    /// An entry is missing a required key or has a key of the wrong kind.
    #[error("invalid policy entry {name:?}: {message}")]
    InvalidEntry { name: String, message: String },

    /// A nested entry has no `policy` object.
    #[error("nested policy entry {name:?} has no \"policy\" object")]
    MissingNestedPolicy { name: String },

    /// An entry has an empty name.
    #[error("policy entry under {path:?} has an empty name")]
    EmptyName { path: String },

    /// `attr_type` is negative or does not fit in 16 bits.
    #[error("policy entry {name:?}: attr_type {value} out of range 0..=65535")]
    AttrTypeOutOfRange { name: String, value: i64 },

    /// Two entries at the same level share an `attr_type`.
    #[error("attr_type {attr_type} used by both {first:?} and {second:?}")]
    DuplicateAttrType {
        attr_type: u16,
        first: String,
        second: String,
    },

    /// Nested policies are deeper than the configured limit.
    #[error("policy nesting exceeds configured max depth ({max})")]
    TooDeep { max: usize },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
