/// Errors that can occur while writing netlink attribute records.
#[derive(Debug, thiserror::Error)]
pub enum AttrError {
    /// The payload does not fit in the 16-bit record length field.
    #[error("attribute payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload is longer than the length declared for the record.
    #[error("attribute payload ({size} bytes) exceeds declared length {declared}")]
    PayloadExceedsLength { size: usize, declared: usize },
}

pub type Result<T> = std::result::Result<T, AttrError>;
