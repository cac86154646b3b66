//! Parser states and accumulated parse errors for Local ID strings.

use crate::codebook::name::CodebookName;
use std::fmt::{Display, Formatter};

/// Section of a Local ID string the parser was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalIdParsingState {
    NamingRule,
    VisVersion,
    PrimaryItem,
    SecondaryItemPrefix,
    SecondaryItem,
    ItemDescription,
    MetaQuantity,
    MetaContent,
    MetaCalculation,
    MetaState,
    MetaCommand,
    MetaType,
    MetaPosition,
    MetaDetail,
    MetaPrefix,
    MetaTag,
    Stop,
    /// Nothing usable was parsed.
    EmptyState,
    /// Generic malformed input.
    Formatting,
    Completeness,
}

impl LocalIdParsingState {
    /// State that parses tags of `name`, if it is a Local ID category.
    pub fn for_codebook(name: CodebookName) -> Option<LocalIdParsingState> {
        match name {
            CodebookName::Quantity => Some(Self::MetaQuantity),
            CodebookName::Content => Some(Self::MetaContent),
            CodebookName::Calculation => Some(Self::MetaCalculation),
            CodebookName::State => Some(Self::MetaState),
            CodebookName::Command => Some(Self::MetaCommand),
            CodebookName::Type => Some(Self::MetaType),
            CodebookName::Position => Some(Self::MetaPosition),
            CodebookName::Detail => Some(Self::MetaDetail),
            CodebookName::FunctionalServices
            | CodebookName::MaintenanceCategory
            | CodebookName::ActivityType => None,
        }
    }

    pub fn predefined_message(self) -> Option<&'static str> {
        match self {
            Self::NamingRule => Some("Missing or invalid naming rule"),
            Self::VisVersion => Some("Missing or invalid vis version"),
            Self::PrimaryItem => Some(
                "Invalid or missing Primary item. Local IDs require atleast primary item and 1 metadata tag.",
            ),
            Self::SecondaryItem => Some("Invalid secondary item"),
            Self::ItemDescription => Some("Missing or invalid /meta prefix"),
            Self::MetaQuantity => Some("Invalid metadata tag: Quantity"),
            Self::MetaContent => Some("Invalid metadata tag: Content"),
            Self::MetaCalculation => Some("Invalid metadata tag: Calculation"),
            Self::MetaState => Some("Invalid metadata tag: State"),
            Self::MetaCommand => Some("Invalid metadata tag: Command"),
            Self::MetaType => Some("Invalid metadata tag: Type"),
            Self::MetaPosition => Some("Invalid metadata tag: Position"),
            Self::MetaDetail => Some("Invalid metadata tag: Detail"),
            Self::EmptyState => Some("Missing primary path or metadata"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingError {
    pub state: LocalIdParsingState,
    pub message: String,
}

/// Ordered `(state, message)` records collected while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsingErrors {
    errors: Vec<ParsingError>,
}

impl ParsingErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error; `None` uses the state's predefined message.
    pub fn push(&mut self, state: LocalIdParsingState, message: Option<String>) {
        let message = message.unwrap_or_else(|| {
            state
                .predefined_message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Error in state {state:?}"))
        });
        self.errors.push(ParsingError { state, message });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn has_error_state(&self, state: LocalIdParsingState) -> bool {
        self.errors.iter().any(|error| error.state == state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParsingError> {
        self.errors.iter()
    }
}

impl Display for ParsingErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "Success");
        }
        write!(f, "Parsing errors:")?;
        for error in &self.errors {
            write!(f, "\n\t{:?} - {}", error.state, error.message)?;
        }
        Ok(())
    }
}
