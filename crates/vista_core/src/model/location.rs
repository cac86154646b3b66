//! Relative location vocabulary and location-string validation.
//!
//! # Responsibility
//! - Hold the per-release relative location codes (`P`, `S`, `U`, ...).
//! - Validate location suffixes such as `2`, `21O` or `1PU` before they are
//!   attached to taxonomy nodes.
//!
//! # Invariants
//! - Digits may only appear at the front and must be contiguous.
//! - Every letter is a known relative location code; `N` is never written.
//! - At most one code per `LocationGroup`, letters in ascending order.

use crate::model::vis_version::VisVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validated location suffix. Construct through [`Locations::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(String);

impl Location {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category a relative location code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocationGroup {
    Number,
    Side,
    Vertical,
    Transverse,
    Longitudinal,
}

impl LocationGroup {
    /// Groups a raw code character, or `None` when the code is unsupported.
    pub fn of_code(code: char) -> Option<LocationGroup> {
        match code {
            'N' => Some(Self::Number),
            'P' | 'C' | 'S' => Some(Self::Side),
            'U' | 'M' | 'L' => Some(Self::Vertical),
            'I' | 'O' => Some(Self::Transverse),
            'F' | 'A' => Some(Self::Longitudinal),
            _ => None,
        }
    }
}

/// Wire shape of one relative location entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeLocationDto {
    pub code: char,
    pub name: String,
    #[serde(default)]
    pub definition: Option<String>,
}

/// Wire shape of a release's location vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsDto {
    pub vis_release: String,
    pub items: Vec<RelativeLocationDto>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeLocation {
    pub code: char,
    pub name: String,
    pub definition: Option<String>,
    pub group: LocationGroup,
}

/// Coarse classification of a rejected location string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationValidationResult {
    Invalid,
    InvalidCode,
    InvalidOrder,
    NullOrWhiteSpace,
}

/// Location validation or vocabulary construction failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// A location string was rejected.
    InvalidLocation {
        kind: LocationValidationResult,
        value: String,
        message: String,
    },
    /// Vocabulary data contains a code outside the known groups.
    UnsupportedCode(char),
    /// Dataset release does not match the requested release.
    VersionMismatch { expected: VisVersion, found: String },
}

impl LocationError {
    fn invalid(kind: LocationValidationResult, value: &str, message: String) -> Self {
        Self::InvalidLocation {
            kind,
            value: value.to_string(),
            message,
        }
    }

    pub fn kind(&self) -> Option<LocationValidationResult> {
        match self {
            Self::InvalidLocation { kind, .. } => Some(*kind),
            Self::UnsupportedCode(_) | Self::VersionMismatch { .. } => None,
        }
    }
}

impl Display for LocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLocation { value, message, .. } => {
                write!(f, "invalid location `{value}`: {message}")
            }
            Self::UnsupportedCode(code) => write!(f, "unsupported location code: {code}"),
            Self::VersionMismatch { expected, found } => {
                write!(f, "location data is for release `{found}`, expected `{expected}`")
            }
        }
    }
}

impl Error for LocationError {}

/// Relative location vocabulary of one release.
#[derive(Debug, Clone)]
pub struct Locations {
    vis_version: VisVersion,
    relative_locations: Vec<RelativeLocation>,
    groups_by_code: BTreeMap<char, LocationGroup>,
}

impl Locations {
    /// Builds the vocabulary from its wire shape.
    ///
    /// # Errors
    /// - `VersionMismatch` when `dto.vis_release` names another release.
    /// - `UnsupportedCode` when an entry's code has no location group.
    pub fn from_dto(vis_version: VisVersion, dto: &LocationsDto) -> Result<Self, LocationError> {
        if VisVersion::try_parse(&dto.vis_release) != Some(vis_version) {
            return Err(LocationError::VersionMismatch {
                expected: vis_version,
                found: dto.vis_release.clone(),
            });
        }
        let mut relative_locations = Vec::with_capacity(dto.items.len());
        let mut groups_by_code = BTreeMap::new();
        for item in &dto.items {
            let group =
                LocationGroup::of_code(item.code).ok_or(LocationError::UnsupportedCode(item.code))?;
            if group != LocationGroup::Number {
                groups_by_code.insert(item.code, group);
            }
            relative_locations.push(RelativeLocation {
                code: item.code,
                name: item.name.clone(),
                definition: item.definition.clone(),
                group,
            });
        }

        Ok(Self {
            vis_version,
            relative_locations,
            groups_by_code,
        })
    }

    pub fn vis_version(&self) -> VisVersion {
        self.vis_version
    }

    pub fn relative_locations(&self) -> &[RelativeLocation] {
        &self.relative_locations
    }

    /// Validates `value` and returns it as a [`Location`].
    pub fn parse(&self, value: &str) -> Result<Location, LocationError> {
        if value.trim().is_empty() {
            return Err(LocationError::invalid(
                LocationValidationResult::NullOrWhiteSpace,
                value,
                "location is empty or whitespace".to_string(),
            ));
        }

        let mut seen_letter = false;
        let mut previous_letter: Option<char> = None;
        let mut used_groups: BTreeMap<LocationGroup, char> = BTreeMap::new();

        for ch in value.chars() {
            if ch.is_ascii_digit() {
                if seen_letter {
                    return Err(LocationError::invalid(
                        LocationValidationResult::Invalid,
                        value,
                        "numeric part must be contiguous and precede location codes".to_string(),
                    ));
                }
                continue;
            }
            seen_letter = true;

            let Some(group) = self.groups_by_code.get(&ch).copied() else {
                return Err(LocationError::invalid(
                    LocationValidationResult::InvalidCode,
                    value,
                    format!("unknown location code(s): {}", self.invalid_codes(value)),
                ));
            };
            if let Some(existing) = used_groups.get(&group) {
                return Err(LocationError::invalid(
                    LocationValidationResult::Invalid,
                    value,
                    format!("multiple {group:?} codes, got both `{existing}` and `{ch}`"),
                ));
            }
            if previous_letter.is_some_and(|previous| previous > ch) {
                return Err(LocationError::invalid(
                    LocationValidationResult::InvalidOrder,
                    value,
                    "location codes must be in alphabetical order".to_string(),
                ));
            }
            used_groups.insert(group, ch);
            previous_letter = Some(ch);
        }

        Ok(Location(value.to_string()))
    }

    pub fn try_parse(&self, value: &str) -> Option<Location> {
        self.parse(value).ok()
    }

    fn invalid_codes(&self, value: &str) -> String {
        let mut invalid = value
            .chars()
            .filter(|ch| !ch.is_ascii_digit() && !self.groups_by_code.contains_key(ch))
            .collect::<Vec<_>>();
        invalid.sort_unstable();
        invalid.dedup();
        invalid
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
            .join(",")
    }
}
