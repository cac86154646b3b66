//! Validated routes through a taxonomy release.
//!
//! # Responsibility
//! - Represent a path as its parent chain plus terminal node.
//! - Render the short form (leaf parents + terminal) and the full form.
//! - Derive human-readable common names for verbose Local IDs.
//! - Find the individualizable sets: runs of nodes that share one location.
//!
//! # Invariants
//! - `parents[0]` is the root and every consecutive pair is a real edge; the
//!   last parent is a parent of the terminal.
//! - A path without parents is the root node alone.
//! - All nodes come from the same release.
//! - Nodes inside one individualizable set never carry different locations.

use crate::gmod::traversal::TraversalBudgetExhausted;
use crate::gmod::Gmod;
use crate::model::gmod_node::{is_potential_parent, GmodNode};
use crate::model::location::{Location, LocationError};
use crate::model::vis_version::VisVersion;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

/// Result type used by path construction and parsing.
pub type GmodPathResult<T> = Result<T, GmodPathError>;

/// Errors from path construction and parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GmodPathError {
    /// Input string had no segments.
    Empty,
    /// A segment names a code absent from the release.
    UnknownNode { code: String },
    /// A segment's location suffix is malformed.
    InvalidLocation(LocationError),
    /// Structural rule broken: missing edge, wrong root, unmappable terminal
    /// or a location on a node that cannot carry one.
    InvalidGmodPath(String),
    /// Short form resolved to zero or several completions.
    AmbiguousOrInvalidPath { path: String, completions: usize },
    /// The resolution search hit its node budget.
    SearchBudgetExhausted(TraversalBudgetExhausted),
    /// Node or path belongs to another release.
    VersionMismatch {
        expected: VisVersion,
        found: VisVersion,
    },
}

impl Display for GmodPathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "gmod path is empty"),
            Self::UnknownNode { code } => write!(f, "unknown gmod node: {code}"),
            Self::InvalidLocation(err) => write!(f, "{err}"),
            Self::InvalidGmodPath(message) => write!(f, "invalid gmod path: {message}"),
            Self::AmbiguousOrInvalidPath { path, completions } => {
                if *completions == 0 {
                    write!(f, "no valid gmod path matches `{path}`")
                } else {
                    write!(f, "gmod path `{path}` is ambiguous ({completions} completions)")
                }
            }
            Self::SearchBudgetExhausted(err) => write!(f, "{err}"),
            Self::VersionMismatch { expected, found } => {
                write!(f, "expected vis version {expected}, got {found}")
            }
        }
    }
}

impl Error for GmodPathError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidLocation(err) => Some(err),
            Self::SearchBudgetExhausted(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LocationError> for GmodPathError {
    fn from(value: LocationError) -> Self {
        Self::InvalidLocation(value)
    }
}

impl From<TraversalBudgetExhausted> for GmodPathError {
    fn from(value: TraversalBudgetExhausted) -> Self {
        Self::SearchBudgetExhausted(value)
    }
}

/// One human-readable name derived from a path node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonName {
    pub depth: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GmodPath {
    parents: Vec<GmodNode>,
    node: GmodNode,
}

impl GmodPath {
    /// Builds a path after checking every edge against `gmod`.
    ///
    /// # Errors
    /// - `VersionMismatch` when a node belongs to another release.
    /// - `InvalidGmodPath` naming the first missing link.
    pub fn new(gmod: &Gmod, parents: Vec<GmodNode>, node: GmodNode) -> GmodPathResult<Self> {
        if let Some(foreign) = parents
            .iter()
            .chain(std::iter::once(&node))
            .find(|n| n.vis_version() != gmod.vis_version())
        {
            return Err(GmodPathError::VersionMismatch {
                expected: gmod.vis_version(),
                found: foreign.vis_version(),
            });
        }
        if let Some(missing) = Self::find_missing_link(gmod, &parents, &node) {
            let message = match missing {
                MissingLink::NotRooted => format!(
                    "path must start at the root, got `{}`",
                    parents.first().map_or(node.code(), |p| p.code())
                ),
                MissingLink::Edge(index) => {
                    let parent = &parents[index];
                    let child = parents.get(index + 1).unwrap_or(&node);
                    format!("`{}` is not a parent of `{}`", parent.code(), child.code())
                }
            };
            return Err(GmodPathError::InvalidGmodPath(message));
        }
        location_sets(&parents, &node)?;
        Ok(Self::new_unchecked(parents, node))
    }

    pub(crate) fn new_unchecked(parents: Vec<GmodNode>, node: GmodNode) -> Self {
        Self { parents, node }
    }

    pub fn is_valid(gmod: &Gmod, parents: &[GmodNode], node: &GmodNode) -> bool {
        Self::find_missing_link(gmod, parents, node).is_none()
    }

    /// Returns where the chain breaks, or `None` for a structurally valid path.
    pub fn find_missing_link(
        gmod: &Gmod,
        parents: &[GmodNode],
        node: &GmodNode,
    ) -> Option<MissingLink> {
        let Some(first) = parents.first() else {
            return (!node.is_root()).then_some(MissingLink::NotRooted);
        };
        if !first.is_root() {
            return Some(MissingLink::NotRooted);
        }
        for (index, parent) in parents.iter().enumerate() {
            let child = parents.get(index + 1).unwrap_or(node);
            if !gmod.is_child(parent, child) {
                return Some(MissingLink::Edge(index));
            }
        }
        None
    }

    pub fn vis_version(&self) -> VisVersion {
        self.node.vis_version()
    }

    pub fn node(&self) -> &GmodNode {
        &self.node
    }

    pub fn parents(&self) -> &[GmodNode] {
        &self.parents
    }

    /// Number of nodes, terminal included.
    pub fn len(&self) -> usize {
        self.parents.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, depth: usize) -> Option<&GmodNode> {
        if depth == self.parents.len() {
            Some(&self.node)
        } else {
            self.parents.get(depth)
        }
    }

    /// Every node from the root to the terminal with its depth.
    pub fn full_path(&self) -> impl Iterator<Item = (usize, &GmodNode)> {
        self.parents
            .iter()
            .chain(std::iter::once(&self.node))
            .enumerate()
    }

    pub fn is_mappable(&self, gmod: &Gmod) -> bool {
        gmod.is_mappable(&self.node)
    }

    pub fn without_locations(&self) -> GmodPath {
        GmodPath {
            parents: self.parents.iter().map(GmodNode::without_location).collect(),
            node: self.node.without_location(),
        }
    }

    /// Every node joined by `/`, root first.
    pub fn to_full_path_string(&self) -> String {
        self.full_path()
            .map(|(_, node)| node.to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Name the node at `depth` assigns to the terminal or to a node on this
    /// path through its normal assignment table.
    pub fn normal_assignment_name(&self, depth: usize) -> Option<&str> {
        let node = self.get(depth)?;
        let names = &node.metadata().normal_assignment_names;
        if names.is_empty() {
            return None;
        }
        if let Some(name) = names.get(self.node.code()) {
            return Some(name.as_str());
        }
        self.parents
            .iter()
            .rev()
            .find_map(|parent| names.get(parent.code()).map(String::as_str))
    }

    /// Common names of the function leaves (and the terminal) on this path.
    pub fn common_names(&self) -> Vec<CommonName> {
        let terminal_depth = self.parents.len();
        let mut names = Vec::new();
        for (depth, node) in self.full_path() {
            let is_target = depth == terminal_depth;
            if !(node.is_leaf_node() || is_target) || !node.is_function_node() {
                continue;
            }
            let metadata = node.metadata();
            let mut name = metadata
                .common_name
                .clone()
                .unwrap_or_else(|| metadata.name.clone());
            let assignments = &metadata.normal_assignment_names;
            if let Some(assigned) = assignments.get(self.node.code()) {
                name = assigned.clone();
            }
            for parent in self.parents[depth.min(terminal_depth)..].iter().rev() {
                if let Some(assigned) = assignments.get(parent.code()) {
                    name = assigned.clone();
                }
            }
            names.push(CommonName { depth, name });
        }
        names
    }

    /// Verbose segments: lower-cased common names, `.` separated, with the
    /// node location appended.
    pub fn verbose_names(&self) -> Vec<String> {
        self.common_names()
            .into_iter()
            .map(|common| {
                let location = self.get(common.depth).and_then(GmodNode::location);
                let mut rendered = render_verbose_name(&common.name);
                if let Some(location) = location {
                    rendered.push('.');
                    rendered.push_str(location.as_str());
                }
                rendered
            })
            .collect()
    }

    /// Verbose segments joined by `/`, e.g. `propulsion.engine/cylinder.2`.
    pub fn to_verbose_string(&self) -> String {
        self.verbose_names().join("/")
    }

    /// Runs of nodes on this path that are individualized together.
    pub fn individualizable_sets(&self) -> Vec<IndividualizableSet> {
        // Constructed paths passed the same scan, so it cannot fail here.
        location_sets(&self.parents, &self.node).unwrap_or_default()
    }

    /// Whether any node on this path may carry a location.
    pub fn is_individualizable(&self) -> bool {
        !self.individualizable_sets().is_empty()
    }
}

/// Consecutive path nodes that are individualized together.
///
/// A location written on any member applies to every member, e.g. the
/// `-P` in `411.1-P/C101.31` also lands on the `411i` composition above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualizableSet {
    start: usize,
    end: usize,
    location: Option<Location>,
}

impl IndividualizableSet {
    fn single(depth: usize, node: &GmodNode) -> Self {
        Self {
            start: depth,
            end: depth,
            location: node.location().cloned(),
        }
    }

    /// Depths of the members, root at depth 0.
    pub fn depths(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The location shared by the set, if any member carries one.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn contains(&self, depth: usize) -> bool {
        self.depths().contains(&depth)
    }
}

fn node_at<'a>(parents: &'a [GmodNode], node: &'a GmodNode, depth: usize) -> &'a GmodNode {
    parents.get(depth).unwrap_or(node)
}

/// Walks a chain once, opening a candidate set between consecutive
/// potential parents (groups, selections, leaves) and at the terminal.
struct LocationSetsVisitor {
    current_parent_start: Option<usize>,
}

impl LocationSetsVisitor {
    fn new() -> Self {
        Self {
            current_parent_start: None,
        }
    }

    fn visit(
        &mut self,
        depth: usize,
        parents: &[GmodNode],
        target: &GmodNode,
    ) -> GmodPathResult<Option<IndividualizableSet>> {
        let node = node_at(parents, target, depth);
        let is_parent = is_potential_parent(&node.metadata().node_type);
        let is_target = depth == parents.len();

        let Some(start) = self.current_parent_start else {
            if is_parent {
                self.current_parent_start = Some(depth);
            }
            return Ok(node
                .is_individualizable(is_target, false)
                .then(|| IndividualizableSet::single(depth, node)));
        };

        if is_parent || is_target {
            let set = if start + 1 == depth {
                node.is_individualizable(is_target, false)
                    .then(|| IndividualizableSet::single(depth, node))
            } else {
                collect_set(parents, target, start + 1, depth)?
            };
            self.current_parent_start = Some(depth);
            if let Some(set) = set.filter(|set| has_leaf_node(set, parents, target)) {
                return Ok(Some(set));
            }
        }

        if is_target && node.is_individualizable(is_target, false) {
            return Ok(Some(IndividualizableSet::single(depth, node)));
        }
        Ok(None)
    }
}

fn collect_set(
    parents: &[GmodNode],
    target: &GmodNode,
    from: usize,
    to: usize,
) -> GmodPathResult<Option<IndividualizableSet>> {
    let mut set: Option<IndividualizableSet> = None;
    let mut skipped = false;
    let mut has_composition = false;
    for depth in from..=to {
        let node = node_at(parents, target, depth);
        if !node.is_individualizable(depth == parents.len(), true) {
            skipped |= set.is_some();
            continue;
        }
        let shared = set.as_ref().and_then(|set| set.location.as_ref());
        if let (Some(shared), Some(location)) = (shared, node.location()) {
            if shared != location {
                return Err(GmodPathError::InvalidGmodPath(format!(
                    "different locations in one individualizable set: {shared}, {location}"
                )));
            }
        }
        if skipped {
            return Err(GmodPathError::InvalidGmodPath(format!(
                "`{}` is separated from its individualizable set",
                node.code()
            )));
        }
        has_composition |= node.is_function_composition();
        set = Some(match set {
            Some(mut set) => {
                set.end = depth;
                if set.location.is_none() {
                    set.location = node.location().cloned();
                }
                set
            }
            None => IndividualizableSet::single(depth, node),
        });
    }
    Ok(set.filter(|set| !(set.start == set.end && has_composition)))
}

fn has_leaf_node(set: &IndividualizableSet, parents: &[GmodNode], target: &GmodNode) -> bool {
    set.depths()
        .any(|depth| depth == parents.len() || node_at(parents, target, depth).is_leaf_node())
}

/// Every individualizable set along `parents` + `target`.
///
/// # Errors
/// - `InvalidGmodPath` when one set carries two different locations or a
///   set is interrupted by a node that cannot be individualized.
pub(crate) fn location_sets(
    parents: &[GmodNode],
    target: &GmodNode,
) -> GmodPathResult<Vec<IndividualizableSet>> {
    let mut visitor = LocationSetsVisitor::new();
    let mut sets = Vec::new();
    for depth in 0..=parents.len() {
        if let Some(set) = visitor.visit(depth, parents, target)? {
            sets.push(set);
        }
    }
    Ok(sets)
}

/// Copies each set's location onto every member of the set.
///
/// Stops at the first located node that belongs to no set and returns its
/// depth; callers decide whether that is an error.
///
/// # Errors
/// - Everything [`location_sets`] raises.
pub(crate) fn spread_set_locations(
    parents: &mut [GmodNode],
    target: &mut GmodNode,
) -> GmodPathResult<Option<usize>> {
    let mut visitor = LocationSetsVisitor::new();
    for depth in 0..=parents.len() {
        let Some(set) = visitor.visit(depth, parents, target)? else {
            if node_at(parents, target, depth).location().is_some() {
                return Ok(Some(depth));
            }
            continue;
        };
        if set.start == set.end {
            continue;
        }
        let Some(location) = set.location else {
            continue;
        };
        for member in set.start..=set.end {
            let slot = match parents.get_mut(member) {
                Some(parent) => parent,
                None => &mut *target,
            };
            *slot = slot.with_location(location.clone());
        }
    }
    Ok(None)
}

/// Where [`GmodPath::find_missing_link`] found the chain broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingLink {
    /// Path does not start at the root.
    NotRooted,
    /// `parents[index]` is not a parent of the next node.
    Edge(usize),
}

fn is_iso_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~')
}

fn render_verbose_name(name: &str) -> String {
    let mut rendered = String::with_capacity(name.len());
    let mut previous: Option<char> = None;
    for ch in name.chars() {
        if ch == '/' {
            continue;
        }
        let current = if ch == ' ' || !is_iso_char(ch) {
            '.'
        } else {
            ch.to_ascii_lowercase()
        };
        if current == '.' && previous == Some('.') {
            continue;
        }
        rendered.push(current);
        previous = Some(current);
    }
    rendered
}

impl Display for GmodPath {
    /// Short form: leaf parents, located parents and the terminal.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for parent in &self.parents {
            if !parent.is_leaf_node() && parent.location().is_none() {
                continue;
            }
            if !first {
                f.write_str("/")?;
            }
            write!(f, "{parent}")?;
            first = false;
        }
        if !first {
            f.write_str("/")?;
        }
        write!(f, "{}", self.node)
    }
}
