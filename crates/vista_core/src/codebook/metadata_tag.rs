//! Validated metadata tag value.
//!
//! # Invariants
//! - Only `Codebook` creates tags, so the standard/custom decision always
//!   comes from codebook validation.
//! - The separator is derived from the value kind: `-` standard, `~` custom.

use crate::codebook::name::CodebookName;
use std::fmt::{Display, Formatter};

/// Tag value discriminated by whether it belongs to the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagValue {
    Standard(String),
    Custom(String),
}

impl TagValue {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard(value) | Self::Custom(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataTag {
    name: CodebookName,
    value: TagValue,
}

impl MetadataTag {
    pub(crate) fn new(name: CodebookName, value: TagValue) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> CodebookName {
        self.name
    }

    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    pub fn tag_value(&self) -> &TagValue {
        &self.value
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.value, TagValue::Custom(_))
    }

    pub fn prefix(&self) -> &'static str {
        self.name.prefix()
    }

    pub fn separator(&self) -> char {
        if self.is_custom() {
            '~'
        } else {
            '-'
        }
    }
}

impl Display for MetadataTag {
    /// Renders the `meta` segment, e.g. `qty-temperature` or `pos~custom.spot`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.prefix(), self.separator(), self.value())
    }
}
