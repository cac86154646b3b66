//! GMOD taxonomy store.
//!
//! # Responsibility
//! - Own one release's immutable node table and parent/child edges.
//! - Answer structural queries (children, parents, normal assignments,
//!   mappability) for the path model, parser and converter.
//!
//! # Invariants
//! - Nodes live in an arena; edges are index lists, so the DAG needs no
//!   shared ownership between nodes.
//! - Exactly one root node (`VE`) exists.
//! - The store is never mutated after `Gmod::from_dto` returns.
//!
//! # See also
//! - `gmod::path` for the validated route type.

pub mod parser;
pub mod path;
pub mod traversal;

use crate::model::gmod_node::{GmodNode, GmodNodeMetadata, ROOT_CODE};
use crate::model::vis_version::VisVersion;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wire shape of one taxonomy node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmodNodeDto {
    pub code: String,
    pub category: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub common_definition: Option<String>,
    #[serde(default)]
    pub install_substructure: Option<bool>,
    #[serde(default)]
    pub normal_assignment_names: BTreeMap<String, String>,
}

/// Wire shape of a whole release: nodes plus `[parent, child]` relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmodDto {
    pub vis_release: String,
    pub items: Vec<GmodNodeDto>,
    pub relations: Vec<[String; 2]>,
}

/// Result type used by taxonomy construction.
pub type GmodResult<T> = Result<T, GmodError>;

/// Errors raised while building a taxonomy store from data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GmodError {
    /// Dataset release does not match the requested release.
    VersionMismatch { expected: VisVersion, found: String },
    /// Two nodes share a code.
    DuplicateCode(String),
    /// A relation references a code absent from the node list.
    UnknownRelationNode { parent: String, child: String },
    /// No `VE` node in the dataset.
    MissingRoot,
}

impl Display for GmodError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VersionMismatch { expected, found } => {
                write!(f, "gmod data is for release `{found}`, expected `{expected}`")
            }
            Self::DuplicateCode(code) => write!(f, "duplicate gmod node code: {code}"),
            Self::UnknownRelationNode { parent, child } => {
                write!(f, "relation {parent} -> {child} references an unknown node")
            }
            Self::MissingRoot => write!(f, "gmod data has no root node `{ROOT_CODE}`"),
        }
    }
}

impl Error for GmodError {}

#[derive(Debug, Clone)]
struct NodeEntry {
    node: GmodNode,
    children: Vec<usize>,
    parents: Vec<usize>,
}

/// One release of the taxonomy.
#[derive(Debug, Clone)]
pub struct Gmod {
    vis_version: VisVersion,
    entries: Vec<NodeEntry>,
    by_code: HashMap<String, usize>,
    root: usize,
}

impl Gmod {
    /// Builds the store for `vis_version` from its wire shape.
    ///
    /// # Errors
    /// - `VersionMismatch` when `dto.vis_release` names another release.
    /// - `DuplicateCode`, `UnknownRelationNode`, `MissingRoot` on malformed data.
    pub fn from_dto(vis_version: VisVersion, dto: &GmodDto) -> GmodResult<Self> {
        if VisVersion::try_parse(&dto.vis_release) != Some(vis_version) {
            return Err(GmodError::VersionMismatch {
                expected: vis_version,
                found: dto.vis_release.clone(),
            });
        }

        let mut entries = Vec::with_capacity(dto.items.len());
        let mut by_code = HashMap::with_capacity(dto.items.len());
        for (index, item) in dto.items.iter().enumerate() {
            if by_code.insert(item.code.clone(), index).is_some() {
                return Err(GmodError::DuplicateCode(item.code.clone()));
            }
            let metadata = GmodNodeMetadata {
                category: item.category.clone(),
                node_type: item.node_type.clone(),
                name: item.name.clone(),
                common_name: item.common_name.clone(),
                definition: item.definition.clone(),
                common_definition: item.common_definition.clone(),
                install_substructure: item.install_substructure,
                normal_assignment_names: item.normal_assignment_names.clone(),
            };
            entries.push(NodeEntry {
                node: GmodNode::new(index, vis_version, &item.code, metadata),
                children: Vec::new(),
                parents: Vec::new(),
            });
        }

        for [parent_code, child_code] in &dto.relations {
            let (Some(&parent), Some(&child)) =
                (by_code.get(parent_code), by_code.get(child_code))
            else {
                return Err(GmodError::UnknownRelationNode {
                    parent: parent_code.clone(),
                    child: child_code.clone(),
                });
            };
            entries[parent].children.push(child);
            entries[child].parents.push(parent);
        }

        let root = *by_code.get(ROOT_CODE).ok_or(GmodError::MissingRoot)?;

        info!(
            "event=gmod_load module=gmod status=ok vis_version={} nodes={} relations={}",
            vis_version,
            entries.len(),
            dto.relations.len()
        );

        Ok(Self {
            vis_version,
            entries,
            by_code,
            root,
        })
    }

    pub fn vis_version(&self) -> VisVersion {
        self.vis_version
    }

    pub fn root_node(&self) -> &GmodNode {
        &self.entries[self.root].node
    }

    pub fn node_by_code(&self, code: &str) -> Option<&GmodNode> {
        self.by_code.get(code).map(|index| &self.entries[*index].node)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates nodes in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &GmodNode> {
        self.entries.iter().map(|entry| &entry.node)
    }

    pub fn children<'a>(&'a self, node: &GmodNode) -> impl Iterator<Item = &'a GmodNode> + 'a {
        let indexes = self
            .entry_index(node)
            .map(|index| self.entries[index].children.as_slice())
            .unwrap_or(&[]);
        indexes.iter().map(move |index| &self.entries[*index].node)
    }

    pub fn parents<'a>(&'a self, node: &GmodNode) -> impl Iterator<Item = &'a GmodNode> + 'a {
        let indexes = self
            .entry_index(node)
            .map(|index| self.entries[index].parents.as_slice())
            .unwrap_or(&[]);
        indexes.iter().map(move |index| &self.entries[*index].node)
    }

    pub fn child_count(&self, node: &GmodNode) -> usize {
        self.entry_index(node)
            .map_or(0, |index| self.entries[index].children.len())
    }

    pub fn parent_count(&self, node: &GmodNode) -> usize {
        self.entry_index(node)
            .map_or(0, |index| self.entries[index].parents.len())
    }

    /// Whether `child` is a direct child of `parent` in this release.
    pub fn is_child(&self, parent: &GmodNode, child: &GmodNode) -> bool {
        let Some(child_index) = self.entry_index(child) else {
            return false;
        };
        self.entry_index(parent)
            .is_some_and(|index| self.entries[index].children.contains(&child_index))
    }

    /// The node's normal assignment: its single child when that child is a
    /// product type and the node is a function node.
    pub fn product_type(&self, node: &GmodNode) -> Option<&GmodNode> {
        self.single_function_child(node)
            .filter(|child| child.is_product_type())
    }

    /// Same shape as [`Gmod::product_type`] for a product selection child.
    pub fn product_selection(&self, node: &GmodNode) -> Option<&GmodNode> {
        self.single_function_child(node)
            .filter(|child| child.is_product_selection())
    }

    pub fn is_product_type_assignment(&self, parent: &GmodNode, child: &GmodNode) -> bool {
        parent.metadata().category.contains("FUNCTION")
            && child.is_product_type()
            && self.is_child(parent, child)
    }

    pub fn is_product_selection_assignment(&self, parent: &GmodNode, child: &GmodNode) -> bool {
        parent.metadata().category.contains("FUNCTION")
            && child.is_product_selection()
            && self.is_child(parent, child)
    }

    /// Whether `node` may terminate a path referencing a measurement point.
    pub fn is_mappable(&self, node: &GmodNode) -> bool {
        if self.product_type(node).is_some() || self.product_selection(node).is_some() {
            return false;
        }
        if node.is_product_selection() || node.is_asset() {
            return false;
        }
        !matches!(node.code().chars().last(), Some('a') | Some('s'))
    }

    fn single_function_child(&self, node: &GmodNode) -> Option<&GmodNode> {
        if !node.metadata().category.contains("FUNCTION") {
            return None;
        }
        let index = self.entry_index(node)?;
        match self.entries[index].children.as_slice() {
            [only] => Some(&self.entries[*only].node),
            _ => None,
        }
    }

    /// Resolves `node` to its arena slot, tolerating nodes from other releases
    /// by falling back to a code lookup.
    fn entry_index(&self, node: &GmodNode) -> Option<usize> {
        if node.vis_version() == self.vis_version {
            if let Some(entry) = self.entries.get(node.index()) {
                if entry.node.code() == node.code() {
                    return Some(node.index());
                }
            }
        }
        self.by_code.get(node.code()).copied()
    }

    pub(crate) fn node_at(&self, index: usize) -> &GmodNode {
        &self.entries[index].node
    }

    pub(crate) fn children_indexes(&self, index: usize) -> &[usize] {
        &self.entries[index].children
    }

    pub(crate) fn resolve_index(&self, node: &GmodNode) -> Option<usize> {
        self.entry_index(node)
    }
}

#[cfg(test)]
mod tests {
    use super::{Gmod, GmodDto, GmodError, GmodNodeDto};
    use crate::model::vis_version::VisVersion;
    use std::collections::BTreeMap;

    fn item(code: &str, category: &str, node_type: &str) -> GmodNodeDto {
        GmodNodeDto {
            code: code.to_string(),
            category: category.to_string(),
            node_type: node_type.to_string(),
            name: code.to_string(),
            common_name: None,
            definition: None,
            common_definition: None,
            install_substructure: None,
            normal_assignment_names: BTreeMap::new(),
        }
    }

    fn relation(parent: &str, child: &str) -> [String; 2] {
        [parent.to_string(), child.to_string()]
    }

    fn small_dto() -> GmodDto {
        GmodDto {
            vis_release: "3-4a".to_string(),
            items: vec![
                item("VE", "ASSET FUNCTION", "GROUP"),
                item("411.1", "ASSET FUNCTION", "LEAF"),
                item("C101", "PRODUCT", "TYPE"),
                item("500a", "ASSET FUNCTION", "GROUP"),
            ],
            relations: vec![
                relation("VE", "411.1"),
                relation("VE", "500a"),
                relation("411.1", "C101"),
            ],
        }
    }

    #[test]
    fn builds_edges_and_normal_assignment() {
        let gmod = Gmod::from_dto(VisVersion::V3_4a, &small_dto()).unwrap();
        let leaf = gmod.node_by_code("411.1").unwrap();
        let product = gmod.node_by_code("C101").unwrap();

        assert!(gmod.root_node().is_root());
        assert!(gmod.is_child(leaf, product));
        assert!(!gmod.is_child(product, leaf));
        assert_eq!(gmod.product_type(leaf).map(|n| n.code()), Some("C101"));
        assert!(gmod.is_product_type_assignment(leaf, product));
        assert_eq!(gmod.parents(product).count(), 1);
        assert_eq!(gmod.children(gmod.root_node()).count(), 2);
    }

    #[test]
    fn mappability_excludes_assigned_and_abstract_nodes() {
        let gmod = Gmod::from_dto(VisVersion::V3_4a, &small_dto()).unwrap();
        assert!(!gmod.is_mappable(gmod.node_by_code("411.1").unwrap()));
        assert!(!gmod.is_mappable(gmod.node_by_code("500a").unwrap()));
        assert!(gmod.is_mappable(gmod.node_by_code("C101").unwrap()));
    }

    #[test]
    fn rejects_inconsistent_data() {
        let mut dto = small_dto();
        dto.relations.push(relation("VE", "X1"));
        assert!(matches!(
            Gmod::from_dto(VisVersion::V3_4a, &dto).unwrap_err(),
            GmodError::UnknownRelationNode { .. }
        ));

        let mut dto = small_dto();
        dto.items.remove(0);
        dto.relations.clear();
        assert_eq!(
            Gmod::from_dto(VisVersion::V3_4a, &dto).unwrap_err(),
            GmodError::MissingRoot
        );

        assert!(matches!(
            Gmod::from_dto(VisVersion::V3_5a, &small_dto()).unwrap_err(),
            GmodError::VersionMismatch { .. }
        ));
    }
}
