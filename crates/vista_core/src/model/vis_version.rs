//! VIS release identifiers.
//!
//! # Responsibility
//! - Name every taxonomy release the core understands.
//! - Provide total ordering so conversions can step release by release.
//!
//! # Invariants
//! - Display form is the wire form used inside Local IDs (`3-4a`).
//! - `VisVersion::all()` is sorted oldest first.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One published VIS/GMOD release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VisVersion {
    #[serde(rename = "3-4a")]
    V3_4a,
    #[serde(rename = "3-5a")]
    V3_5a,
    #[serde(rename = "3-6a")]
    V3_6a,
    #[serde(rename = "3-7a")]
    V3_7a,
    #[serde(rename = "3-8a")]
    V3_8a,
}

const ALL_VERSIONS: [VisVersion; 5] = [
    VisVersion::V3_4a,
    VisVersion::V3_5a,
    VisVersion::V3_6a,
    VisVersion::V3_7a,
    VisVersion::V3_8a,
];

impl VisVersion {
    /// Returns every known release, oldest first.
    pub fn all() -> &'static [VisVersion] {
        &ALL_VERSIONS
    }

    /// Returns the newest known release.
    pub fn latest() -> VisVersion {
        VisVersion::V3_8a
    }

    /// Wire form, e.g. `3-4a`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V3_4a => "3-4a",
            Self::V3_5a => "3-5a",
            Self::V3_6a => "3-6a",
            Self::V3_7a => "3-7a",
            Self::V3_8a => "3-8a",
        }
    }

    pub fn next(self) -> Option<VisVersion> {
        let position = ALL_VERSIONS.iter().position(|v| *v == self)?;
        ALL_VERSIONS.get(position + 1).copied()
    }

    pub fn previous(self) -> Option<VisVersion> {
        let position = ALL_VERSIONS.iter().position(|v| *v == self)?;
        position
            .checked_sub(1)
            .and_then(|index| ALL_VERSIONS.get(index).copied())
    }

    /// Parses the wire form; accepts the `vis-` prefixed form too.
    pub fn parse(value: &str) -> Result<VisVersion, VisVersionError> {
        let trimmed = value.trim();
        let bare = trimmed.strip_prefix("vis-").unwrap_or(trimmed);
        ALL_VERSIONS
            .iter()
            .copied()
            .find(|version| version.as_str() == bare)
            .ok_or_else(|| VisVersionError(value.to_string()))
    }

    pub fn try_parse(value: &str) -> Option<VisVersion> {
        Self::parse(value).ok()
    }
}

impl Display for VisVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VisVersion {
    type Err = VisVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Unknown release string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisVersionError(pub String);

impl Display for VisVersionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown vis version: {}", self.0)
    }
}

impl Error for VisVersionError {}
