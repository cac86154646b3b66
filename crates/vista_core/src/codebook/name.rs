//! Metadata tag categories and their wire prefixes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One controlled vocabulary.
///
/// Variant order is the canonical tag order of a rendered Local ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodebookName {
    Quantity,
    Content,
    Calculation,
    State,
    Command,
    Type,
    FunctionalServices,
    MaintenanceCategory,
    ActivityType,
    Position,
    Detail,
}

/// Categories a Local ID may carry, in rendering order.
pub const LOCAL_ID_CODEBOOKS: [CodebookName; 8] = [
    CodebookName::Quantity,
    CodebookName::Content,
    CodebookName::Calculation,
    CodebookName::State,
    CodebookName::Command,
    CodebookName::Type,
    CodebookName::Position,
    CodebookName::Detail,
];

const ALL_CODEBOOKS: [CodebookName; 11] = [
    CodebookName::Quantity,
    CodebookName::Content,
    CodebookName::Calculation,
    CodebookName::State,
    CodebookName::Command,
    CodebookName::Type,
    CodebookName::FunctionalServices,
    CodebookName::MaintenanceCategory,
    CodebookName::ActivityType,
    CodebookName::Position,
    CodebookName::Detail,
];

impl CodebookName {
    pub fn all() -> &'static [CodebookName] {
        &ALL_CODEBOOKS
    }

    /// Prefix used in the `meta` section, e.g. `qty`.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Quantity => "qty",
            Self::Content => "cnt",
            Self::Calculation => "calc",
            Self::State => "state",
            Self::Command => "cmd",
            Self::Type => "type",
            Self::FunctionalServices => "funct.svc",
            Self::MaintenanceCategory => "maint.cat",
            Self::ActivityType => "act.type",
            Self::Position => "pos",
            Self::Detail => "detail",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<CodebookName> {
        ALL_CODEBOOKS
            .iter()
            .copied()
            .find(|name| name.prefix() == prefix)
    }

    /// Name used by codebook datasets, e.g. `quantities`.
    pub fn dataset_name(self) -> &'static str {
        match self {
            Self::Quantity => "quantities",
            Self::Content => "contents",
            Self::Calculation => "calculations",
            Self::State => "states",
            Self::Command => "commands",
            Self::Type => "types",
            Self::FunctionalServices => "functional_services",
            Self::MaintenanceCategory => "maintenance_category",
            Self::ActivityType => "activity_type",
            Self::Position => "positions",
            Self::Detail => "detail",
        }
    }

    pub fn from_dataset_name(value: &str) -> Option<CodebookName> {
        ALL_CODEBOOKS
            .iter()
            .copied()
            .find(|name| name.dataset_name() == value)
    }

    pub fn is_local_id_component(self) -> bool {
        LOCAL_ID_CODEBOOKS.contains(&self)
    }
}

impl Display for CodebookName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
