//! Taxonomy version conversion.
//!
//! # Responsibility
//! - Hold per-release node change records (renames, merges, moves).
//! - Convert single nodes release by release in either direction.
//! - Rebuild paths in the target release when the chain of ownership changed.
//!
//! # Invariants
//! - A node whose code has no counterpart in the target release converts to
//!   `None`; that is a normal outcome, not an error.
//! - Unknown releases and records pointing at the wrong adjacent release are
//!   `InvalidConversion`.
//! - A converted path either validates in the target release or the call
//!   fails with `ConversionInvariantViolation`; it is never silently dropped.
//! - When a code change and a normal assignment change coincide on one node,
//!   the code change wins.

use crate::gmod::path::{spread_set_locations, GmodPath};
use crate::gmod::traversal::{TraversalControl, TraversalOptions};
use crate::gmod::Gmod;
use crate::local_id::builder::{LocalId, LocalIdBuilder};
use crate::model::gmod_node::GmodNode;
use crate::model::vis_version::VisVersion;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wire shape of one node's change record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeChangeDto {
    #[serde(default)]
    pub next_vis_version: Option<String>,
    #[serde(default)]
    pub next_code: Option<String>,
    #[serde(default)]
    pub previous_vis_version: Option<String>,
    #[serde(default)]
    pub previous_code: Option<String>,
}

/// Wire shape of all change tables: release -> code -> record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmodVersioningDto {
    pub items: BTreeMap<String, BTreeMap<String, NodeChangeDto>>,
}

/// A code in an adjacent release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedCode {
    pub vis_version: VisVersion,
    pub code: String,
}

/// Where a node went in the next release and came from in the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeChange {
    pub next: Option<VersionedCode>,
    pub previous: Option<VersionedCode>,
}

/// Result type used by conversions.
pub type ConversionResult<T> = Result<T, ConversionError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// Unknown release pair, malformed record or unconvertible ancestor.
    InvalidConversion(String),
    /// The change tables could not produce a valid target path.
    ConversionInvariantViolation(String),
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConversion(message) => write!(f, "invalid conversion: {message}"),
            Self::ConversionInvariantViolation(message) => {
                write!(f, "conversion invariant violated: {message}")
            }
        }
    }
}

impl Error for ConversionError {}

fn invalid(message: impl Into<String>) -> ConversionError {
    ConversionError::InvalidConversion(message.into())
}

fn violation(message: impl Into<String>) -> ConversionError {
    let message = message.into();
    error!(
        "event=conversion_invariant module=versioning status=error message={}",
        message
    );
    ConversionError::ConversionInvariantViolation(message)
}

/// Change tables for every loaded release.
#[derive(Debug, Clone, Default)]
pub struct GmodVersioning {
    versions: BTreeSet<VisVersion>,
    tables: BTreeMap<VisVersion, HashMap<String, NodeChange>>,
}

impl GmodVersioning {
    /// Builds the tables from their wire shape.
    ///
    /// # Errors
    /// - `InvalidConversion` for unknown release strings or records that
    ///   declare a release without a code (or the reverse).
    pub fn from_dto(dto: &GmodVersioningDto) -> ConversionResult<Self> {
        let mut versioning = Self::default();
        for (version, records) in &dto.items {
            let version = VisVersion::parse(version).map_err(|err| invalid(err.to_string()))?;
            versioning.versions.insert(version);
            let table = versioning.tables.entry(version).or_default();
            for (code, record) in records {
                let next = versioned_code(&record.next_vis_version, &record.next_code, code)?;
                let previous =
                    versioned_code(&record.previous_vis_version, &record.previous_code, code)?;
                for adjacent in next.iter().chain(previous.iter()) {
                    versioning.versions.insert(adjacent.vis_version);
                }
                table.insert(code.clone(), NodeChange { next, previous });
            }
        }
        Ok(versioning)
    }

    /// Releases mentioned by the tables.
    pub fn known_versions(&self) -> impl Iterator<Item = VisVersion> + '_ {
        self.versions.iter().copied()
    }

    pub fn changes_for(&self, version: VisVersion, code: &str) -> Option<&NodeChange> {
        self.tables.get(&version)?.get(code)
    }

    /// Follows the change records from `source` to `target`, one release at a time.
    pub fn convert_code(
        &self,
        source: VisVersion,
        code: &str,
        target: VisVersion,
    ) -> ConversionResult<String> {
        for version in [source, target] {
            if !self.versions.contains(&version) {
                return Err(invalid(format!("vis version {version} has no change tables")));
            }
        }

        let mut current = source;
        let mut code = code.to_string();
        while current != target {
            let step = if current < target {
                current.next()
            } else {
                current.previous()
            };
            let Some(step) = step else {
                return Err(invalid(format!("no release after {current}")));
            };

            if let Some(change) = self.changes_for(current, &code) {
                let declared = if step > current {
                    &change.next
                } else {
                    &change.previous
                };
                if let Some(declared) = declared {
                    if declared.vis_version != step {
                        return Err(invalid(format!(
                            "record for `{code}` in {current} points at {}, not {step}",
                            declared.vis_version
                        )));
                    }
                    code = declared.code.clone();
                }
            }
            current = step;
        }
        Ok(code)
    }

    /// Converts `node` from `source` into the release of `target`.
    ///
    /// Returns `Ok(None)` when the converted code is absent from `target`.
    pub fn convert_node(
        &self,
        source: VisVersion,
        node: &GmodNode,
        target: &Gmod,
    ) -> ConversionResult<Option<GmodNode>> {
        if node.vis_version() != source {
            return Err(invalid(format!(
                "node `{}` belongs to {}, not {source}",
                node.code(),
                node.vis_version()
            )));
        }
        let code = self.convert_code(source, node.code(), target.vis_version())?;
        Ok(target
            .node_by_code(&code)
            .map(|converted| converted.try_with_location(node.location().cloned())))
    }

    /// Converts `path` from the `source` release into the `target` release.
    ///
    /// # Errors
    /// - `InvalidConversion` for unknown releases or when an ancestor has no
    ///   counterpart.
    /// - `ConversionInvariantViolation` when no valid target path can be built.
    pub fn convert_path(
        &self,
        source: &Gmod,
        path: &GmodPath,
        target: &Gmod,
    ) -> ConversionResult<Option<GmodPath>> {
        let source_version = source.vis_version();
        let Some(end) = self.convert_node(source_version, path.node(), target)? else {
            debug!(
                "event=path_convert module=versioning status=unmapped source={} target={} path={}",
                source_version,
                target.vis_version(),
                path
            );
            return Ok(None);
        };
        if end.is_root() {
            return Ok(Some(GmodPath::new_unchecked(Vec::new(), end)));
        }

        let mut qualifying = Vec::with_capacity(path.len());
        for (_, node) in path.full_path() {
            let converted = self.convert_node(source_version, node, target)?.ok_or_else(|| {
                invalid(format!(
                    "`{}` has no counterpart in {}",
                    node.code(),
                    target.vis_version()
                ))
            })?;
            qualifying.push(QualifyingNode {
                source: node.clone(),
                target: converted,
            });
        }

        let mut candidates: Vec<GmodNode> = Vec::with_capacity(qualifying.len());
        for pair in &qualifying[..qualifying.len() - 1] {
            if candidates
                .last()
                .is_some_and(|last| last.code() == pair.target.code())
            {
                continue;
            }
            candidates.push(pair.target.clone());
        }
        if candidates.last().is_some_and(|last| last.code() == end.code()) {
            candidates.pop();
        }

        let converted = if GmodPath::is_valid(target, &candidates, &end) {
            GmodPath::new_unchecked(candidates, end)
        } else {
            let built = rebuild_path(source, target, &qualifying, &end)?;
            finalize_path(target, built, path)?
        };

        debug!(
            "event=path_convert module=versioning status=ok source={} target={} from={} to={}",
            source_version,
            target.vis_version(),
            path,
            converted
        );
        Ok(Some(converted))
    }

    /// Converts both items of `local_id` into the release of `target`,
    /// carrying the metadata tags and the verbose flag over.
    ///
    /// Returns `Ok(None)` when an item has no counterpart in `target`.
    ///
    /// # Errors
    /// - Everything [`GmodVersioning::convert_path`] raises.
    /// - `InvalidConversion` when the converted items no longer form a
    ///   valid Local ID.
    pub fn convert_local_id(
        &self,
        source: &Gmod,
        local_id: &LocalId,
        target: &Gmod,
    ) -> ConversionResult<Option<LocalId>> {
        if local_id.vis_version() != source.vis_version() {
            return Err(invalid(format!(
                "local id belongs to {}, not {}",
                local_id.vis_version(),
                source.vis_version()
            )));
        }
        let mut builder = LocalIdBuilder::create(target.vis_version())
            .with_verbose_mode(local_id.verbose_mode());
        if let Some(primary) = local_id.primary_item() {
            let Some(converted) = self.convert_path(source, primary, target)? else {
                return Ok(None);
            };
            builder = builder
                .with_primary_item(converted)
                .map_err(|err| invalid(err.to_string()))?;
        }
        if let Some(secondary) = local_id.secondary_item() {
            let Some(converted) = self.convert_path(source, secondary, target)? else {
                return Ok(None);
            };
            builder = builder
                .with_secondary_item(converted)
                .map_err(|err| invalid(err.to_string()))?;
        }
        for tag in local_id.metadata_tags() {
            builder = builder
                .with_metadata_tag(tag.clone())
                .map_err(|err| invalid(err.to_string()))?;
        }
        builder
            .build()
            .map(Some)
            .map_err(|err| invalid(err.to_string()))
    }
}

fn versioned_code(
    version: &Option<String>,
    code: &Option<String>,
    owner: &str,
) -> ConversionResult<Option<VersionedCode>> {
    match (version, code) {
        (None, None) => Ok(None),
        (Some(version), Some(code)) => Ok(Some(VersionedCode {
            vis_version: VisVersion::parse(version).map_err(|err| invalid(err.to_string()))?,
            code: code.clone(),
        })),
        _ => Err(invalid(format!(
            "change record for `{owner}` must give both release and code"
        ))),
    }
}

struct QualifyingNode {
    source: GmodNode,
    target: GmodNode,
}

fn assignment_changed(source: Option<&GmodNode>, target: Option<&GmodNode>) -> bool {
    match (source, target) {
        (None, None) => false,
        (Some(source), Some(target)) => source.code() != target.code(),
        _ => true,
    }
}

fn rebuild_path(
    source_gmod: &Gmod,
    target_gmod: &Gmod,
    qualifying: &[QualifyingNode],
    end: &GmodNode,
) -> ConversionResult<Vec<GmodNode>> {
    let mut path: Vec<GmodNode> = Vec::new();
    let mut i = 0;
    while i < qualifying.len() {
        let QualifyingNode { source, target } = &qualifying[i];

        if i > 0 && target.code() == qualifying[i - 1].target.code() {
            merge_duplicate(source_gmod, target_gmod, &mut path, source, &qualifying[i - 1])?;
            i += 1;
            continue;
        }

        let code_changed = source.code() != target.code();
        let source_assignment = source_gmod.product_type(source);
        let target_assignment = target_gmod.product_type(target);

        if code_changed {
            add_to_path(target_gmod, &mut path, target.clone())?;
        } else if assignment_changed(source_assignment, target_assignment) {
            add_to_path(target_gmod, &mut path, target.clone())?;

            if source_assignment.is_some() && target_assignment.is_none() {
                if target.code() == end.code()
                    && qualifying
                        .get(i + 1)
                        .is_some_and(|next| next.target.code() != target.code())
                {
                    return Err(violation(format!(
                        "normal assignment of end node `{}` was deleted",
                        target.code()
                    )));
                }
                i += 1;
                continue;
            }

            if target.code() != end.code() {
                if let Some(assignment) = target_assignment {
                    add_to_path(target_gmod, &mut path, assignment.clone())?;
                    if let Some(old_assignment) = source_assignment {
                        if qualifying
                            .get(i + 1)
                            .is_some_and(|next| next.source.code() != old_assignment.code())
                        {
                            return Err(violation(format!(
                                "expected `{}` after `{}` in source path",
                                old_assignment.code(),
                                source.code()
                            )));
                        }
                        i += 1;
                    }
                }
            }
        } else {
            add_to_path(target_gmod, &mut path, target.clone())?;
        }

        if path.last().is_some_and(|last| last.code() == end.code()) {
            break;
        }
        i += 1;
    }
    Ok(path)
}

/// Handles a node whose target code repeats the previous one (a merge).
fn merge_duplicate(
    source_gmod: &Gmod,
    target_gmod: &Gmod,
    path: &mut [GmodNode],
    source: &GmodNode,
    previous: &QualifyingNode,
) -> ConversionResult<()> {
    if let Some(assignment) = source_gmod.product_type(source) {
        let previous_assignment = target_gmod.product_type(&previous.target);
        if previous_assignment.map(GmodNode::code) != Some(assignment.code()) {
            return Err(violation(format!(
                "merged node `{}` has a different normal assignment",
                source.code()
            )));
        }
    }

    let Some(location) = source.location() else {
        return Ok(());
    };
    let Some(index) = path
        .iter()
        .position(|node| node.code() == previous.target.code())
    else {
        return Ok(());
    };
    let existing = &path[index];
    if existing.location().is_some_and(|current| current != location) {
        return Err(violation(format!(
            "colliding locations while merging into `{}`",
            existing.code()
        )));
    }
    if !existing.is_individualizable(false, false) {
        return Err(violation(format!(
            "merged node `{}` cannot carry a location",
            existing.code()
        )));
    }
    if existing.location().is_none() {
        let located = existing.with_location(location.clone());
        path[index] = located;
    }
    Ok(())
}

/// Appends `node`, dropping trailing nodes and inserting intermediates until
/// the chain is connected again.
fn add_to_path(gmod: &Gmod, path: &mut Vec<GmodNode>, node: GmodNode) -> ConversionResult<()> {
    let connected = path.last().map_or(true, |last| gmod.is_child(last, &node));
    if connected {
        path.push(node);
        return Ok(());
    }

    for j in (0..path.len()).rev() {
        match path_exists_between(gmod, &path[..=j], &node)? {
            None => {
                let parent_code = path[j].code();
                let keeps_anchor = path[..=j]
                    .iter()
                    .any(|n| n.is_asset_function_node() && n.code() != parent_code);
                if !keeps_anchor {
                    return Err(violation(format!(
                        "reconnecting `{}` would drop the last asset function node",
                        node.code()
                    )));
                }
                path.remove(j);
            }
            Some(remaining) => {
                for intermediate in remaining {
                    let located = match node.location() {
                        Some(location) if intermediate.is_individualizable(false, true) => {
                            intermediate.with_location(location.clone())
                        }
                        _ => intermediate,
                    };
                    path.push(located);
                }
                break;
            }
        }
    }

    path.push(node);
    Ok(())
}

/// Searches below the last asset function node of `from_path` (or the root)
/// for `to`, returning the intermediate nodes missing from `from_path`.
fn path_exists_between(
    gmod: &Gmod,
    from_path: &[GmodNode],
    to: &GmodNode,
) -> ConversionResult<Option<Vec<GmodNode>>> {
    let start = from_path
        .iter()
        .rev()
        .find(|node| node.is_asset_function_node())
        .and_then(|node| gmod.node_by_code(node.code()))
        .unwrap_or_else(|| gmod.root_node());

    let mut remaining: Option<Vec<GmodNode>> = None;
    let mut ambiguous_parent: Option<String> = None;
    let search = gmod.traverse_from(start, &TraversalOptions::default(), |parents, node| {
        if node.code() != to.code() {
            return TraversalControl::Continue;
        }

        let mut chain: Vec<GmodNode> = parents.iter().map(|parent| (*parent).clone()).collect();
        while let Some(first) = chain.first() {
            if first.is_root() {
                break;
            }
            let mut first_parents = gmod.parents(first);
            match (first_parents.next(), first_parents.next()) {
                (Some(only), None) => {
                    let only = only.clone();
                    chain.insert(0, only);
                }
                _ => {
                    ambiguous_parent = Some(first.code().to_string());
                    return TraversalControl::Stop;
                }
            }
        }

        let covers_prefix = from_path
            .iter()
            .all(|kept| chain.iter().any(|node| node.code() == kept.code()));
        if covers_prefix {
            remaining = Some(
                chain
                    .into_iter()
                    .filter(|node| !from_path.iter().any(|kept| kept.code() == node.code()))
                    .collect(),
            );
            return TraversalControl::Stop;
        }
        TraversalControl::Continue
    });

    if let Err(err) = search {
        return Err(violation(err.to_string()));
    }
    if let Some(code) = ambiguous_parent {
        return Err(violation(format!(
            "`{code}` has several parents while reconnecting `{}`",
            to.code()
        )));
    }
    Ok(remaining)
}

fn finalize_path(
    gmod: &Gmod,
    mut path: Vec<GmodNode>,
    source_path: &GmodPath,
) -> ConversionResult<GmodPath> {
    let Some(mut node) = path.pop() else {
        return Err(violation(format!("no path produced for `{source_path}`")));
    };
    // A stray located node ends the fix-up; the nodes after it stay as built.
    spread_set_locations(&mut path, &mut node).map_err(|err| violation(err.to_string()))?;
    if !GmodPath::is_valid(gmod, &path, &node) {
        return Err(violation(format!(
            "rebuilt path for `{source_path}` is not valid in {}",
            gmod.vis_version()
        )));
    }
    Ok(GmodPath::new_unchecked(path, node))
}
