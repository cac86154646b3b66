//! Depth-first traversal over a taxonomy release.
//!
//! # Responsibility
//! - Walk the DAG from the root (or any node) with an explicit stack.
//! - Let callers steer the walk per node (`Continue`, `SkipSubtree`, `Stop`).
//!
//! # Invariants
//! - Nodes with `install_substructure == Some(false)` are never visited.
//! - A node code appears on the current stack at most
//!   `max_traversal_occurrence` times; product selection assignments are exempt.
//! - The walk never exceeds `max_visited_nodes` handler calls or `max_depth`;
//!   hitting either limit is an error, never a silent cut-off.

use crate::gmod::Gmod;
use crate::model::gmod_node::GmodNode;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Handler decision for the node just visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalControl {
    Continue,
    SkipSubtree,
    Stop,
}

/// How a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOutcome {
    Completed,
    Stopped,
}

/// Search limits for taxonomy walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalOptions {
    pub max_traversal_occurrence: usize,
    pub max_visited_nodes: usize,
    pub max_depth: usize,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_traversal_occurrence: 1,
            max_visited_nodes: 250_000,
            max_depth: 64,
        }
    }
}

/// A search limit stopped the walk before it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalBudgetExhausted {
    /// More than `max_visited_nodes` handler calls were needed.
    VisitedNodes { visited: usize },
    /// A node at `max_depth` still had children to descend into.
    Depth { max_depth: usize },
}

impl Display for TraversalBudgetExhausted {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VisitedNodes { visited } => {
                write!(f, "taxonomy traversal exceeded its budget after {visited} nodes")
            }
            Self::Depth { max_depth } => {
                write!(f, "taxonomy traversal exceeded its maximum depth of {max_depth}")
            }
        }
    }
}

impl Error for TraversalBudgetExhausted {}

struct Frame {
    index: usize,
    next_child: usize,
}

impl Gmod {
    /// Walks the whole release from the root.
    pub fn traverse<F>(
        &self,
        options: &TraversalOptions,
        handler: F,
    ) -> Result<TraversalOutcome, TraversalBudgetExhausted>
    where
        F: FnMut(&[&GmodNode], &GmodNode) -> TraversalControl,
    {
        self.traverse_from(self.root_node(), options, handler)
    }

    /// Walks the sub-DAG below `start`; `start` itself is visited first with
    /// an empty parent list.
    pub fn traverse_from<F>(
        &self,
        start: &GmodNode,
        options: &TraversalOptions,
        mut handler: F,
    ) -> Result<TraversalOutcome, TraversalBudgetExhausted>
    where
        F: FnMut(&[&GmodNode], &GmodNode) -> TraversalControl,
    {
        let Some(start_index) = self.resolve_index(start) else {
            return Ok(TraversalOutcome::Completed);
        };

        let mut frames: Vec<Frame> = Vec::new();
        let mut parents: Vec<&GmodNode> = Vec::new();
        let mut occurrences: HashMap<usize, usize> = HashMap::new();
        let mut visited = 0usize;
        let mut pending = Some(start_index);

        loop {
            if let Some(index) = pending.take() {
                let node = self.node_at(index);
                if node.metadata().install_substructure != Some(false) {
                    visited += 1;
                    if visited > options.max_visited_nodes {
                        return Err(TraversalBudgetExhausted::VisitedNodes { visited });
                    }

                    match handler(&parents, node) {
                        TraversalControl::Stop => return Ok(TraversalOutcome::Stopped),
                        TraversalControl::SkipSubtree => {}
                        TraversalControl::Continue => {
                            let exempt = parents
                                .last()
                                .is_some_and(|parent| self.is_product_selection_assignment(parent, node));
                            let seen = occurrences.get(&index).copied().unwrap_or(0);
                            let within_limit = exempt || seen < options.max_traversal_occurrence;
                            if within_limit
                                && frames.len() >= options.max_depth
                                && !self.children_indexes(index).is_empty()
                            {
                                return Err(TraversalBudgetExhausted::Depth {
                                    max_depth: options.max_depth,
                                });
                            }
                            if within_limit {
                                frames.push(Frame {
                                    index,
                                    next_child: 0,
                                });
                                parents.push(node);
                                *occurrences.entry(index).or_insert(0) += 1;
                            }
                        }
                    }
                }
            }

            let Some(frame) = frames.last_mut() else {
                break;
            };
            let children = self.children_indexes(frame.index);
            if let Some(child) = children.get(frame.next_child) {
                frame.next_child += 1;
                pending = Some(*child);
            } else {
                let index = frame.index;
                frames.pop();
                parents.pop();
                if let Some(count) = occurrences.get_mut(&index) {
                    *count = count.saturating_sub(1);
                }
            }
        }

        Ok(TraversalOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::{TraversalBudgetExhausted, TraversalControl, TraversalOptions, TraversalOutcome};
    use crate::gmod::{Gmod, GmodDto, GmodNodeDto};
    use crate::model::vis_version::VisVersion;
    use std::collections::BTreeMap;

    fn item(code: &str, node_type: &str, install_substructure: Option<bool>) -> GmodNodeDto {
        GmodNodeDto {
            code: code.to_string(),
            category: "ASSET FUNCTION".to_string(),
            node_type: node_type.to_string(),
            name: code.to_string(),
            common_name: None,
            definition: None,
            common_definition: None,
            install_substructure,
            normal_assignment_names: BTreeMap::new(),
        }
    }

    fn gmod() -> Gmod {
        let dto = GmodDto {
            vis_release: "3-4a".to_string(),
            items: vec![
                item("VE", "GROUP", None),
                item("100a", "GROUP", None),
                item("110", "GROUP", None),
                item("120", "GROUP", Some(false)),
                item("111", "LEAF", None),
            ],
            relations: vec![
                ["VE".to_string(), "100a".to_string()],
                ["100a".to_string(), "110".to_string()],
                ["100a".to_string(), "120".to_string()],
                ["110".to_string(), "111".to_string()],
                ["120".to_string(), "111".to_string()],
            ],
        };
        Gmod::from_dto(VisVersion::V3_4a, &dto).unwrap()
    }

    #[test]
    fn visits_depth_first_and_skips_uninstalled_substructure() {
        let gmod = gmod();
        let mut seen = Vec::new();
        let outcome = gmod
            .traverse(&TraversalOptions::default(), |parents, node| {
                seen.push(format!("{}:{}", parents.len(), node.code()));
                TraversalControl::Continue
            })
            .unwrap();

        assert_eq!(outcome, TraversalOutcome::Completed);
        assert_eq!(seen, vec!["0:VE", "1:100a", "2:110", "3:111"]);
    }

    #[test]
    fn stop_and_skip_subtree_are_honoured() {
        let gmod = gmod();
        let mut seen = Vec::new();
        gmod.traverse(&TraversalOptions::default(), |_, node| {
            seen.push(node.code().to_string());
            if node.code() == "110" {
                TraversalControl::SkipSubtree
            } else {
                TraversalControl::Continue
            }
        })
        .unwrap();
        assert!(!seen.contains(&"111".to_string()));

        let outcome = gmod
            .traverse(&TraversalOptions::default(), |_, node| {
                if node.code() == "100a" {
                    TraversalControl::Stop
                } else {
                    TraversalControl::Continue
                }
            })
            .unwrap();
        assert_eq!(outcome, TraversalOutcome::Stopped);
    }

    #[test]
    fn node_budget_guard_fires() {
        let gmod = gmod();
        let options = TraversalOptions {
            max_visited_nodes: 2,
            ..TraversalOptions::default()
        };
        let err = gmod
            .traverse(&options, |_, _| TraversalControl::Continue)
            .unwrap_err();
        assert_eq!(err, TraversalBudgetExhausted::VisitedNodes { visited: 3 });
    }

    #[test]
    fn depth_guard_fires_instead_of_cutting_the_walk() {
        let gmod = gmod();
        let shallow = TraversalOptions {
            max_depth: 2,
            ..TraversalOptions::default()
        };
        let err = gmod
            .traverse(&shallow, |_, _| TraversalControl::Continue)
            .unwrap_err();
        assert_eq!(err, TraversalBudgetExhausted::Depth { max_depth: 2 });

        let exact = TraversalOptions {
            max_depth: 3,
            ..TraversalOptions::default()
        };
        let outcome = gmod
            .traverse(&exact, |_, _| TraversalControl::Continue)
            .unwrap();
        assert_eq!(outcome, TraversalOutcome::Completed);
    }
}
