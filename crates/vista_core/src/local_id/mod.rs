//! Local ID: compound identifiers over taxonomy paths and metadata tags.
//!
//! # Responsibility
//! - Build identifiers incrementally with fallible (`with_*`) and
//!   non-failing (`try_with_*`) steps.
//! - Render the canonical string and parse it back.
//!
//! # Invariants
//! - A built Local ID has a primary item or at least one metadata tag.
//! - At most one tag per category, rendered in canonical category order.
//! - `parse(s).to_string() == s` for every string the parser accepts.
//!
//! # See also
//! - `codebook` for tag validation, `gmod::parser` for item paths.

pub mod builder;
pub mod parser;
pub mod parsing;

use parsing::ParsingErrors;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Naming rule marker that opens every Local ID.
pub const NAMING_RULE: &str = "dnv-v2";

/// Result type used by Local ID building and parsing.
pub type LocalIdResult<T> = Result<T, LocalIdError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalIdError {
    /// Builder rejected a component.
    InvalidComponent(String),
    /// Neither a primary item nor a metadata tag was set.
    EmptyLocalId,
    /// Parsing failed; carries every `(state, message)` record.
    Parse(ParsingErrors),
}

impl Display for LocalIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidComponent(message) => write!(f, "invalid local id component: {message}"),
            Self::EmptyLocalId => write!(f, "local id has neither primary item nor metadata tags"),
            Self::Parse(errors) => write!(f, "failed to parse local id: {errors}"),
        }
    }
}

impl Error for LocalIdError {}
