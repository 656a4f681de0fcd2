use nljson_attr::DataType;

use crate::policy::AttributePolicy;

/// One compiled policy entry.
///
/// A nested policy is present exactly when the data type is
/// [`DataType::Nested`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    attr_type: u16,
    data_type: DataType,
    name: String,
    min_length: usize,
    max_length: usize,
    nested: Option<AttributePolicy>,
}

impl AttributeSpec {
    pub(crate) fn new(
        attr_type: u16,
        data_type: DataType,
        name: String,
        min_length: usize,
        max_length: usize,
        nested: Option<AttributePolicy>,
    ) -> Self {
        debug_assert_eq!(nested.is_some(), data_type == DataType::Nested);
        Self {
            attr_type,
            data_type,
            name,
            min_length,
            max_length,
            nested,
        }
    }

    pub fn attr_type(&self) -> u16 {
        self.attr_type
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Label used as the JSON member name when encoding.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Minimum payload length, 0 when unconstrained.
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Maximum payload length, 0 when unconstrained.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn nested_policy(&self) -> Option<&AttributePolicy> {
        self.nested.as_ref()
    }

    /// True when a payload of `len` bytes satisfies the length bounds.
    pub fn accepts_len(&self, len: usize) -> bool {
        len >= self.min_length && (self.max_length == 0 || len <= self.max_length)
    }
}
