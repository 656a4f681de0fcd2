use nljson_policy::SchemaError;

/// Errors that can occur while encoding or decoding attribute streams.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The policy could not be compiled.
    #[error("policy error: {0}")]
    Schema(#[from] SchemaError),

    /// The input is not syntactically valid JSON.
    #[error("malformed JSON input: {0}")]
    Parse(#[source] serde_json::Error),

    /// The input ends before a complete value or record.
    #[error("incomplete input")]
    Incomplete,

    /// An attribute does not match its declared type, length or shape.
    #[error("invalid attribute {attr:?}: {message}")]
    Validation { attr: String, message: String },

    /// The caller's output buffer is smaller than the output.
    #[error("output buffer too small ({needed} bytes needed, {available} available)")]
    Capacity { needed: usize, available: usize },

    /// The output buffer could not be allocated.
    #[error("failed to allocate {0} bytes of output")]
    Allocation(usize),

    /// JSON output could not be written.
    #[error("failed to write JSON output: {0}")]
    Output(#[source] serde_json::Error),

    /// An I/O error occurred on a sink or source.
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub(crate) fn invalid(attr: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            attr: attr.to_string(),
            message: message.into(),
        }
    }

    /// Standard OS error code closest to this error.
    pub fn errno(&self) -> i32 {
        match self {
            Self::Schema(_) | Self::Parse(_) | Self::Validation { .. } => libc::EINVAL,
            Self::Incomplete => libc::EAGAIN,
            Self::Capacity { .. } => libc::ENOBUFS,
            Self::Allocation(_) => libc::ENOMEM,
            Self::Output(err) if err.is_io() => libc::EIO,
            Self::Output(_) => libc::EINVAL,
            Self::Io(err) => err.raw_os_error().unwrap_or(libc::EIO),
        }
    }

    /// True when more input may turn this failure into a success.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete)
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
