//! Path string parsing.
//!
//! # Responsibility
//! - Turn short-form (`411.1/C101.31-2`) and full-form (`VE/400a/.../C101.31-2`)
//!   strings into validated [`GmodPath`] values.
//! - Prove short-form strings unambiguous by enumerating every completion.
//!
//! # Invariants
//! - Short form: explicit segments are matched in order; leaf nodes are never
//!   passed implicitly; exactly one completion must exist.
//! - Only members of an individualizable set carry a location, and a location
//!   written on one member is copied onto the whole set.
//! - With `require_mappable`, the terminal node is mappable.

use crate::gmod::path::{spread_set_locations, GmodPath, GmodPathError, GmodPathResult};
use crate::gmod::traversal::{TraversalControl, TraversalOptions};
use crate::gmod::Gmod;
use crate::model::gmod_node::GmodNode;
use crate::model::location::{Location, Locations};
use log::debug;

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathParseOptions {
    pub traversal: TraversalOptions,
    pub require_mappable: bool,
}

impl Default for PathParseOptions {
    fn default() -> Self {
        Self {
            traversal: TraversalOptions::default(),
            require_mappable: true,
        }
    }
}

struct Segment<'a> {
    node: &'a GmodNode,
    location: Option<Location>,
}

impl Gmod {
    /// Parses a short-form path with default options.
    pub fn parse_path(&self, item: &str, locations: &Locations) -> GmodPathResult<GmodPath> {
        self.parse_path_with(item, locations, &PathParseOptions::default())
    }

    pub fn try_parse_path(&self, item: &str, locations: &Locations) -> Option<GmodPath> {
        self.parse_path(item, locations).ok()
    }

    /// Parses a short-form path.
    ///
    /// # Errors
    /// - `Empty`, `UnknownNode`, `InvalidLocation` for malformed segments.
    /// - `AmbiguousOrInvalidPath` unless exactly one completion exists.
    /// - `InvalidGmodPath` for unmappable terminals or misplaced locations.
    /// - `SearchBudgetExhausted` when the search exceeds its node budget.
    pub fn parse_path_with(
        &self,
        item: &str,
        locations: &Locations,
        options: &PathParseOptions,
    ) -> GmodPathResult<GmodPath> {
        let result = self.resolve_short_path(item, locations, options);
        if let Err(err) = &result {
            debug!(
                "event=path_parse module=gmod status=error form=short vis_version={} reason={}",
                self.vis_version(),
                err
            );
        }
        result
    }

    /// Parses a full-form path with default options.
    pub fn parse_full_path(&self, item: &str, locations: &Locations) -> GmodPathResult<GmodPath> {
        self.parse_full_path_with(item, locations, &PathParseOptions::default())
    }

    pub fn try_parse_full_path(&self, item: &str, locations: &Locations) -> Option<GmodPath> {
        self.parse_full_path(item, locations).ok()
    }

    /// Parses a full-form path: every node from the root is listed.
    pub fn parse_full_path_with(
        &self,
        item: &str,
        locations: &Locations,
        options: &PathParseOptions,
    ) -> GmodPathResult<GmodPath> {
        let result = self.resolve_full_path(item, locations, options);
        if let Err(err) = &result {
            debug!(
                "event=path_parse module=gmod status=error form=full vis_version={} reason={}",
                self.vis_version(),
                err
            );
        }
        result
    }

    fn resolve_short_path(
        &self,
        item: &str,
        locations: &Locations,
        options: &PathParseOptions,
    ) -> GmodPathResult<GmodPath> {
        let segments = self.split_segments(item, locations)?;

        let mut completions: Vec<Vec<GmodNode>> = Vec::new();
        self.traverse(&options.traversal, |parents, node| {
            let matched = matched_segments(parents, &segments);
            let Some(expected) = segments.get(matched) else {
                return TraversalControl::SkipSubtree;
            };
            if node.code() == expected.node.code() {
                if matched + 1 == segments.len() {
                    let mut completion: Vec<GmodNode> =
                        parents.iter().map(|parent| (*parent).clone()).collect();
                    completion.push(node.clone());
                    completions.push(completion);
                    return TraversalControl::SkipSubtree;
                }
                return TraversalControl::Continue;
            }
            if node.is_leaf_node() {
                return TraversalControl::SkipSubtree;
            }
            TraversalControl::Continue
        })?;

        if completions.len() != 1 {
            return Err(GmodPathError::AmbiguousOrInvalidPath {
                path: item.trim().to_string(),
                completions: completions.len(),
            });
        }
        let Some(completion) = completions.pop() else {
            return Err(GmodPathError::Empty);
        };

        let mut remaining = segments.iter().peekable();
        let mut nodes = Vec::with_capacity(completion.len());
        for node in completion {
            match remaining.peek() {
                Some(segment) if segment.node.code() == node.code() => {
                    nodes.push(node.try_with_location(segment.location.clone()));
                    remaining.next();
                }
                _ => nodes.push(node),
            }
        }

        self.finish_path(nodes, options)
    }

    fn resolve_full_path(
        &self,
        item: &str,
        locations: &Locations,
        options: &PathParseOptions,
    ) -> GmodPathResult<GmodPath> {
        let segments = self.split_segments(item, locations)?;
        if !segments[0].node.is_root() {
            return Err(GmodPathError::InvalidGmodPath(format!(
                "full path must start with `{}`, got `{}`",
                self.root_node().code(),
                segments[0].node.code()
            )));
        }
        let nodes = segments
            .into_iter()
            .map(|segment| segment.node.try_with_location(segment.location))
            .collect();
        self.finish_path(nodes, options)
    }

    fn finish_path(
        &self,
        mut nodes: Vec<GmodNode>,
        options: &PathParseOptions,
    ) -> GmodPathResult<GmodPath> {
        let Some(mut node) = nodes.pop() else {
            return Err(GmodPathError::Empty);
        };

        if let Some(depth) = spread_set_locations(&mut nodes, &mut node)? {
            let stray = nodes.get(depth).unwrap_or(&node);
            return Err(GmodPathError::InvalidGmodPath(format!(
                "`{}` cannot carry a location",
                stray.code()
            )));
        }
        if options.require_mappable && !self.is_mappable(&node) {
            return Err(GmodPathError::InvalidGmodPath(format!(
                "`{}` is not mappable",
                node.code()
            )));
        }

        GmodPath::new(self, nodes, node)
    }

    fn split_segments<'a>(
        &'a self,
        item: &str,
        locations: &Locations,
    ) -> GmodPathResult<Vec<Segment<'a>>> {
        if locations.vis_version() != self.vis_version() {
            return Err(GmodPathError::VersionMismatch {
                expected: self.vis_version(),
                found: locations.vis_version(),
            });
        }

        let trimmed = item.trim();
        let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(GmodPathError::Empty);
        }

        trimmed
            .split('/')
            .map(|part| {
                if part.is_empty() {
                    return Err(GmodPathError::InvalidGmodPath(format!(
                        "empty segment in `{item}`"
                    )));
                }
                let (code, location) = match part.split_once('-') {
                    Some((code, location)) => (code, Some(locations.parse(location)?)),
                    None => (part, None),
                };
                let node = self
                    .node_by_code(code)
                    .ok_or_else(|| GmodPathError::UnknownNode {
                        code: code.to_string(),
                    })?;
                Ok(Segment { node, location })
            })
            .collect()
    }
}

/// Number of explicit segments already matched along `parents`.
fn matched_segments(parents: &[&GmodNode], segments: &[Segment<'_>]) -> usize {
    let mut matched = 0;
    for parent in parents {
        if segments
            .get(matched)
            .is_some_and(|segment| segment.node.code() == parent.code())
        {
            matched += 1;
        }
    }
    matched
}
