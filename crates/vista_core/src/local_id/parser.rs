//! Local ID string parser.
//!
//! # Responsibility
//! - Walk a Local ID string section by section and rebuild the builder that
//!   renders it.
//! - Record every failure as a `(LocalIdParsingState, message)` pair.
//!
//! # Invariants
//! - Accepted strings re-render byte-identically: verbose descriptions must
//!   equal the generated ones, tags must be in canonical order, and the
//!   separator must match the tag's custom/standard kind.
//! - Parsing is a pure function of the string and the taxonomy store.

use crate::codebook::name::CodebookName;
use crate::codebook::{CodebookError, Codebooks};
use crate::gmod::path::GmodPath;
use crate::local_id::builder::{LocalId, LocalIdBuilder};
use crate::local_id::parsing::{LocalIdParsingState, ParsingErrors};
use crate::local_id::{LocalIdError, LocalIdResult, NAMING_RULE};
use crate::model::vis_version::VisVersion;
use crate::vis::TaxonomyStore;
use log::debug;

const SECONDARY_MARKER: &str = "sec";
const META_MARKER: &str = "meta";

impl LocalIdBuilder {
    /// Parses `value` into a builder.
    ///
    /// # Errors
    /// - `Parse` carrying every recorded `(state, message)` pair.
    pub fn parse<S: TaxonomyStore + ?Sized>(value: &str, store: &S) -> LocalIdResult<Self> {
        match Self::try_parse(value, store) {
            (Some(builder), _) => Ok(builder),
            (None, errors) => Err(LocalIdError::Parse(errors)),
        }
    }

    /// Parses `value`, returning the builder (if any) and the error records.
    pub fn try_parse<S: TaxonomyStore + ?Sized>(
        value: &str,
        store: &S,
    ) -> (Option<Self>, ParsingErrors) {
        let mut errors = ParsingErrors::new();
        let builder = parse_builder(value, store, &mut errors);
        let builder = if errors.has_errors() { None } else { builder };
        if builder.is_none() {
            log_failure(value, &errors);
        }
        (builder, errors)
    }
}

impl LocalId {
    /// Parses a canonical (or verbose) Local ID string.
    ///
    /// # Errors
    /// - `Parse` carrying every recorded `(state, message)` pair.
    pub fn parse<S: TaxonomyStore + ?Sized>(value: &str, store: &S) -> LocalIdResult<Self> {
        match Self::try_parse(value, store) {
            (Some(local_id), _) => Ok(local_id),
            (None, errors) => Err(LocalIdError::Parse(errors)),
        }
    }

    pub fn try_parse<S: TaxonomyStore + ?Sized>(
        value: &str,
        store: &S,
    ) -> (Option<Self>, ParsingErrors) {
        let (builder, mut errors) = LocalIdBuilder::try_parse(value, store);
        let Some(builder) = builder else {
            return (None, errors);
        };
        match builder.build() {
            Ok(local_id) => (Some(local_id), errors),
            Err(err) => {
                errors.push(LocalIdParsingState::EmptyState, Some(err.to_string()));
                log_failure(value, &errors);
                (None, errors)
            }
        }
    }
}

fn log_failure(value: &str, errors: &ParsingErrors) {
    let first_state = errors
        .iter()
        .next()
        .map(|error| format!("{:?}", error.state))
        .unwrap_or_else(|| "none".to_string());
    debug!(
        "event=local_id_parse module=local_id status=error error_count={} first_state={} input_len={}",
        errors.len(),
        first_state,
        value.len()
    );
}

/// Cursor over the `/`-separated segments of the input.
struct Segments<'a> {
    items: Vec<&'a str>,
    position: usize,
}

impl<'a> Segments<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.items.get(self.position).copied()
    }

    fn next(&mut self) -> Option<&'a str> {
        let segment = self.peek()?;
        self.position += 1;
        Some(segment)
    }

    /// Consumes segments until a section marker or a description segment.
    fn take_item(&mut self) -> Vec<&'a str> {
        let mut taken = Vec::new();
        while let Some(segment) = self.peek() {
            if segment == SECONDARY_MARKER || segment == META_MARKER || segment.starts_with('~') {
                break;
            }
            taken.push(segment);
            self.position += 1;
        }
        taken
    }

    fn take_descriptions(&mut self) -> Vec<&'a str> {
        let mut taken = Vec::new();
        while let Some(segment) = self.peek().filter(|segment| segment.starts_with('~')) {
            taken.push(segment);
            self.position += 1;
        }
        taken
    }

    fn rest(&mut self) -> &[&'a str] {
        let rest = &self.items[self.position..];
        self.position = self.items.len();
        rest
    }
}

fn parse_builder<S: TaxonomyStore + ?Sized>(
    value: &str,
    store: &S,
    errors: &mut ParsingErrors,
) -> Option<LocalIdBuilder> {
    if value.trim().is_empty() {
        errors.push(LocalIdParsingState::EmptyState, None);
        return None;
    }
    let Some(body) = value.strip_prefix('/') else {
        errors.push(
            LocalIdParsingState::Formatting,
            Some("Invalid format: missing '/' as first character".to_string()),
        );
        return None;
    };
    if body.ends_with('/') {
        errors.push(
            LocalIdParsingState::Formatting,
            Some("Invalid format: trailing '/'".to_string()),
        );
        return None;
    }
    let items: Vec<&str> = body.split('/').collect();
    if items.iter().any(|segment| segment.is_empty()) {
        errors.push(
            LocalIdParsingState::Formatting,
            Some("Invalid format: empty segment".to_string()),
        );
        return None;
    }
    let mut segments = Segments { items, position: 0 };

    if segments.next() != Some(NAMING_RULE) {
        errors.push(LocalIdParsingState::NamingRule, None);
        return None;
    }

    let Some(vis_version) = segments
        .next()
        .and_then(|segment| segment.strip_prefix("vis-"))
        .and_then(VisVersion::try_parse)
    else {
        errors.push(LocalIdParsingState::VisVersion, None);
        return None;
    };
    let (Some(gmod), Some(codebooks), Some(locations)) = (
        store.gmod(vis_version),
        store.codebooks(vis_version),
        store.locations(vis_version),
    ) else {
        errors.push(
            LocalIdParsingState::VisVersion,
            Some(format!("Vis version {vis_version} is not loaded")),
        );
        return None;
    };

    let mut builder = LocalIdBuilder::create(vis_version);

    let primary = segments.take_item();
    if primary.is_empty() {
        if segments.peek() != Some(META_MARKER) {
            errors.push(LocalIdParsingState::PrimaryItem, None);
            return None;
        }
    } else {
        let item = primary.join("/");
        match gmod.parse_path(&item, locations) {
            Ok(path) => builder = with_item(builder, path, true, errors)?,
            Err(err) => {
                errors.push(
                    LocalIdParsingState::PrimaryItem,
                    Some(format!("Invalid primary item `{item}`: {err}")),
                );
                return None;
            }
        }
    }

    if segments.peek() == Some(SECONDARY_MARKER) {
        segments.next();
        if builder.primary_item().is_none() {
            errors.push(
                LocalIdParsingState::SecondaryItemPrefix,
                Some("Secondary item requires a primary item".to_string()),
            );
            return None;
        }
        let secondary = segments.take_item();
        if secondary.is_empty() {
            errors.push(LocalIdParsingState::SecondaryItem, None);
            return None;
        }
        let item = secondary.join("/");
        match gmod.parse_path(&item, locations) {
            Ok(path) => builder = with_item(builder, path, false, errors)?,
            Err(err) => {
                errors.push(
                    LocalIdParsingState::SecondaryItem,
                    Some(format!("Invalid secondary item `{item}`: {err}")),
                );
                return None;
            }
        }
    }

    let descriptions = segments.take_descriptions();
    if !descriptions.is_empty() {
        let expected = builder.item_descriptions();
        if descriptions.iter().copied().ne(expected.iter().map(String::as_str)) {
            errors.push(
                LocalIdParsingState::ItemDescription,
                Some(format!(
                    "Item description `{}` does not match `{}`",
                    descriptions.join("/"),
                    expected.join("/")
                )),
            );
            return None;
        }
        builder = builder.with_verbose_mode(true);
    }

    if segments.next() != Some(META_MARKER) {
        errors.push(LocalIdParsingState::ItemDescription, None);
        return None;
    }

    builder = parse_tags(builder, segments.rest(), codebooks, errors);

    if builder.is_empty() {
        errors.push(LocalIdParsingState::EmptyState, None);
        return None;
    }
    Some(builder)
}

fn with_item(
    builder: LocalIdBuilder,
    path: GmodPath,
    primary: bool,
    errors: &mut ParsingErrors,
) -> Option<LocalIdBuilder> {
    let (result, state) = if primary {
        (builder.with_primary_item(path), LocalIdParsingState::PrimaryItem)
    } else {
        (builder.with_secondary_item(path), LocalIdParsingState::SecondaryItem)
    };
    match result {
        Ok(builder) => Some(builder),
        Err(err) => {
            errors.push(state, Some(err.to_string()));
            None
        }
    }
}

fn parse_tags(
    mut builder: LocalIdBuilder,
    segments: &[&str],
    codebooks: &Codebooks,
    errors: &mut ParsingErrors,
) -> LocalIdBuilder {
    let mut previous: Option<CodebookName> = None;
    for segment in segments {
        let Some(separator_at) = segment.find(['-', '~']) else {
            errors.push(
                LocalIdParsingState::MetaTag,
                Some(format!("Missing '-' or '~' separator in metadata tag `{segment}`")),
            );
            continue;
        };
        let prefix = &segment[..separator_at];
        let separator = segment[separator_at..].chars().next().unwrap_or('-');
        let value = &segment[separator_at + 1..];

        let Some((name, state)) = CodebookName::from_prefix(prefix)
            .and_then(|name| LocalIdParsingState::for_codebook(name).map(|state| (name, state)))
        else {
            errors.push(
                LocalIdParsingState::MetaPrefix,
                Some(CodebookError::UnknownPrefix(prefix.to_string()).to_string()),
            );
            continue;
        };

        if let Some(previous) = previous.filter(|previous| *previous >= name) {
            errors.push(
                state,
                Some(format!(
                    "Metadata tag `{prefix}` must come before `{}`",
                    previous.prefix()
                )),
            );
            continue;
        }
        previous = Some(name);

        let tag = match codebooks.create_tag(name, value) {
            Ok(tag) => tag,
            Err(err) => {
                errors.push(state, Some(err.to_string()));
                continue;
            }
        };
        if tag.is_custom() && separator != '~' {
            errors.push(
                state,
                Some(format!(
                    "Invalid {prefix} metadata tag: '{value}'. Use prefix '~' for custom values"
                )),
            );
            continue;
        }
        if !tag.is_custom() && separator != '-' {
            errors.push(
                state,
                Some(format!(
                    "Invalid {prefix} metadata tag: '{value}'. Use prefix '-' for standard values"
                )),
            );
            continue;
        }
        builder = match builder.clone().with_metadata_tag(tag) {
            Ok(updated) => updated,
            Err(err) => {
                errors.push(state, Some(err.to_string()));
                builder
            }
        };
    }
    builder
}
