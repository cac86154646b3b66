//! Codebooks: controlled vocabularies for metadata tags.
//!
//! # Responsibility
//! - Hold each category's standard values and value -> group mapping.
//! - Validate candidate tag values and decide standard vs custom.
//! - Enforce the canonical ordering/grouping of compound positions.
//!
//! # Invariants
//! - Tag values match `[a-z0-9.]+` (`[a-z0-9.-]+` for Position).
//! - `<number>` is a group marker, never a standard value.
//! - Detail values are never custom; the Detail codebook is always present.

pub mod metadata_tag;
pub mod name;

use crate::model::vis_version::VisVersion;
use metadata_tag::{MetadataTag, TagValue};
use name::CodebookName;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

static TAG_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9.]+$").expect("valid tag value regex"));
static POSITION_VALUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9.\-]+$").expect("valid position value regex"));

const NUMBER_GROUP: &str = "<number>";
const DEFAULT_GROUP: &str = "DEFAULT_GROUP";

/// Wire shape of one codebook: group -> values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodebookDto {
    pub name: String,
    pub values: BTreeMap<String, Vec<String>>,
}

/// Wire shape of a release's codebooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodebooksDto {
    pub vis_release: String,
    pub items: Vec<CodebookDto>,
}

/// Result type used by codebook operations.
pub type CodebookResult<T> = Result<T, CodebookError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodebookError {
    /// Candidate value failed the alphabet or category rules.
    InvalidTagValue {
        codebook: CodebookName,
        value: String,
        reason: String,
    },
    /// Dataset names a codebook this crate does not know.
    UnknownCodebook(String),
    /// `meta` prefix does not name a codebook.
    UnknownPrefix(String),
    /// The loaded release has no data for this codebook.
    MissingCodebook(CodebookName),
    /// Dataset release does not match the requested release.
    VersionMismatch { expected: VisVersion, found: String },
}

impl Display for CodebookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTagValue {
                codebook,
                value,
                reason,
            } => write!(f, "invalid value `{value}` for codebook {codebook}: {reason}"),
            Self::UnknownCodebook(value) => write!(f, "unknown codebook: {value}"),
            Self::UnknownPrefix(value) => write!(f, "unknown metadata tag prefix: {value}"),
            Self::MissingCodebook(name) => write!(f, "codebook not loaded: {name}"),
            Self::VersionMismatch { expected, found } => {
                write!(f, "codebook data is for release `{found}`, expected `{expected}`")
            }
        }
    }
}

impl Error for CodebookError {}

/// Outcome of position validation. Values below `Valid` reject the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PositionValidationResult {
    Invalid = 0,
    InvalidOrder = 1,
    InvalidGrouping = 2,
    Valid = 100,
    Custom = 101,
}

impl PositionValidationResult {
    pub fn is_accepted(self) -> bool {
        self >= Self::Valid
    }
}

/// One category's vocabulary.
#[derive(Debug, Clone)]
pub struct Codebook {
    name: CodebookName,
    raw_data: BTreeMap<String, Vec<String>>,
    group_map: HashMap<String, String>,
    standard_values: HashSet<String>,
    groups: BTreeSet<String>,
}

impl Codebook {
    pub fn from_dto(dto: &CodebookDto) -> CodebookResult<Self> {
        let name = CodebookName::from_dataset_name(dto.name.trim())
            .ok_or_else(|| CodebookError::UnknownCodebook(dto.name.clone()))?;
        Ok(Self::with_values(name, dto.values.clone()))
    }

    fn with_values(name: CodebookName, raw_data: BTreeMap<String, Vec<String>>) -> Self {
        let mut group_map = HashMap::new();
        let mut standard_values = HashSet::new();
        let mut groups = BTreeSet::new();
        for (group, values) in &raw_data {
            let group = group.trim();
            for value in values {
                let value = value.trim();
                if value == NUMBER_GROUP {
                    continue;
                }
                group_map.insert(value.to_string(), group.to_string());
                standard_values.insert(value.to_string());
                groups.insert(group.to_string());
            }
        }
        Self {
            name,
            raw_data,
            group_map,
            standard_values,
            groups,
        }
    }

    pub fn name(&self) -> CodebookName {
        self.name
    }

    pub fn raw_data(&self) -> &BTreeMap<String, Vec<String>> {
        &self.raw_data
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    pub fn standard_values(&self) -> impl Iterator<Item = &str> {
        self.standard_values.iter().map(String::as_str)
    }

    /// Whether `value` is in the vocabulary. Numeric positions always are.
    pub fn has_standard_value(&self, value: &str) -> bool {
        if self.name == CodebookName::Position && is_numeric(value) {
            return true;
        }
        self.standard_values.contains(value)
    }

    pub fn try_create_tag(&self, value: &str) -> Option<MetadataTag> {
        self.create_tag(value).ok()
    }

    /// Validates `value` and returns a standard or custom tag.
    ///
    /// # Errors
    /// - `InvalidTagValue` when the alphabet or position rules reject `value`.
    pub fn create_tag(&self, value: &str) -> CodebookResult<MetadataTag> {
        let reject = |reason: String| CodebookError::InvalidTagValue {
            codebook: self.name,
            value: value.to_string(),
            reason,
        };

        if self.name == CodebookName::Position {
            let validation = self.validate_position(value);
            return match validation {
                PositionValidationResult::Valid => Ok(MetadataTag::new(
                    self.name,
                    TagValue::Standard(value.to_string()),
                )),
                PositionValidationResult::Custom => Ok(MetadataTag::new(
                    self.name,
                    TagValue::Custom(value.to_string()),
                )),
                rejected => Err(reject(format!("position validation failed: {rejected:?}"))),
            };
        }

        if !TAG_VALUE_RE.is_match(value) {
            return Err(reject(
                "value must be non-empty and use only [a-z0-9.]".to_string(),
            ));
        }
        let is_custom = self.name != CodebookName::Detail && !self.has_standard_value(value);
        let tag_value = if is_custom {
            TagValue::Custom(value.to_string())
        } else {
            TagValue::Standard(value.to_string())
        };
        Ok(MetadataTag::new(self.name, tag_value))
    }

    /// Validates a (possibly `-` compound) position value.
    pub fn validate_position(&self, position: &str) -> PositionValidationResult {
        if !POSITION_VALUE_RE.is_match(position) {
            return PositionValidationResult::Invalid;
        }
        if self.standard_values.contains(position) || is_numeric(position) {
            return PositionValidationResult::Valid;
        }
        if !position.contains('-') {
            return PositionValidationResult::Custom;
        }

        let parts: Vec<&str> = position.split('-').collect();
        let validations: Vec<PositionValidationResult> = parts
            .iter()
            .map(|part| self.validate_position(part))
            .collect();
        if let Some(worst) = validations
            .iter()
            .copied()
            .filter(|result| !result.is_accepted())
            .max()
        {
            return worst;
        }

        let number_not_at_end = parts
            .iter()
            .enumerate()
            .any(|(index, part)| is_numeric(part) && index + 1 < parts.len());
        let named: Vec<&str> = parts
            .iter()
            .copied()
            .filter(|part| !is_numeric(part))
            .collect();
        let sorted = named.windows(2).all(|pair| pair[0] < pair[1]);
        if number_not_at_end || !sorted {
            return PositionValidationResult::InvalidOrder;
        }

        if validations
            .iter()
            .all(|result| *result == PositionValidationResult::Valid)
        {
            let groups: Vec<&str> = parts
                .iter()
                .map(|part| {
                    if is_numeric(part) {
                        NUMBER_GROUP
                    } else {
                        self.group_map
                            .get(*part)
                            .map(String::as_str)
                            .unwrap_or(DEFAULT_GROUP)
                    }
                })
                .filter(|group| *group != DEFAULT_GROUP)
                .collect();
            let distinct: HashSet<&str> = groups.iter().copied().collect();
            if distinct.len() != groups.len() {
                return PositionValidationResult::InvalidGrouping;
            }
        }

        validations
            .into_iter()
            .max()
            .unwrap_or(PositionValidationResult::Invalid)
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}

/// All codebooks of one release.
#[derive(Debug, Clone)]
pub struct Codebooks {
    vis_version: VisVersion,
    codebooks: BTreeMap<CodebookName, Codebook>,
}

impl Codebooks {
    /// Builds every codebook in `dto`; Detail is always added empty.
    ///
    /// # Errors
    /// - `VersionMismatch` when `dto.vis_release` names another release.
    /// - `UnknownCodebook` when an entry names an unknown vocabulary.
    pub fn from_dto(vis_version: VisVersion, dto: &CodebooksDto) -> CodebookResult<Self> {
        if VisVersion::try_parse(&dto.vis_release) != Some(vis_version) {
            return Err(CodebookError::VersionMismatch {
                expected: vis_version,
                found: dto.vis_release.clone(),
            });
        }
        let mut codebooks = BTreeMap::new();
        for item in &dto.items {
            let codebook = Codebook::from_dto(item)?;
            codebooks.insert(codebook.name(), codebook);
        }
        codebooks.insert(
            CodebookName::Detail,
            Codebook::with_values(CodebookName::Detail, BTreeMap::new()),
        );
        Ok(Self {
            vis_version,
            codebooks,
        })
    }

    pub fn vis_version(&self) -> VisVersion {
        self.vis_version
    }

    pub fn get(&self, name: CodebookName) -> Option<&Codebook> {
        self.codebooks.get(&name)
    }

    pub fn codebook(&self, name: CodebookName) -> CodebookResult<&Codebook> {
        self.get(name).ok_or(CodebookError::MissingCodebook(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CodebookName, &Codebook)> {
        self.codebooks.iter().map(|(name, codebook)| (*name, codebook))
    }

    pub fn create_tag(&self, name: CodebookName, value: &str) -> CodebookResult<MetadataTag> {
        self.codebook(name)?.create_tag(value)
    }

    pub fn try_create_tag(&self, name: CodebookName, value: &str) -> Option<MetadataTag> {
        self.get(name)?.try_create_tag(value)
    }
}
