//! Taxonomy node value type.
//!
//! # Responsibility
//! - Carry a node's identity (code) and descriptive metadata.
//! - Answer node-local predicates (leaf, function, product, individualizable).
//!
//! # Invariants
//! - Two nodes are equal iff `code` and `location` are equal.
//! - Located variants are new values; the node owned by the taxonomy store
//!   never carries a location.
//! - `index` is only meaningful inside the `Gmod` that created the node.

use crate::model::location::Location;
use crate::model::vis_version::VisVersion;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Code of the taxonomy root in every release.
pub const ROOT_CODE: &str = "VE";

/// Descriptive attributes shared by every located variant of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GmodNodeMetadata {
    pub category: String,
    pub node_type: String,
    pub name: String,
    pub common_name: Option<String>,
    pub definition: Option<String>,
    pub common_definition: Option<String>,
    pub install_substructure: Option<bool>,
    /// Child code -> display name used when that child is the normal assignment.
    pub normal_assignment_names: BTreeMap<String, String>,
}

impl GmodNodeMetadata {
    /// `"{category} {type}"`, e.g. `ASSET FUNCTION LEAF`.
    pub fn full_type(&self) -> String {
        format!("{} {}", self.category, self.node_type)
    }
}

#[derive(Debug, Clone)]
pub struct GmodNode {
    index: usize,
    vis_version: VisVersion,
    code: Arc<str>,
    metadata: Arc<GmodNodeMetadata>,
    location: Option<Location>,
}

impl GmodNode {
    pub(crate) fn new(
        index: usize,
        vis_version: VisVersion,
        code: &str,
        metadata: GmodNodeMetadata,
    ) -> Self {
        Self {
            index,
            vis_version,
            code: Arc::from(code),
            metadata: Arc::new(metadata),
            location: None,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn vis_version(&self) -> VisVersion {
        self.vis_version
    }

    pub fn metadata(&self) -> &GmodNodeMetadata {
        &self.metadata
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Returns a located copy of this node.
    pub fn with_location(&self, location: Location) -> GmodNode {
        GmodNode {
            location: Some(location),
            ..self.clone()
        }
    }

    /// Returns a located copy when `location` is set, otherwise an unlocated copy.
    pub fn try_with_location(&self, location: Option<Location>) -> GmodNode {
        GmodNode {
            location,
            ..self.clone()
        }
    }

    pub fn without_location(&self) -> GmodNode {
        GmodNode {
            location: None,
            ..self.clone()
        }
    }

    pub fn is_root(&self) -> bool {
        &*self.code == ROOT_CODE
    }

    pub fn is_leaf_node(&self) -> bool {
        let full_type = self.metadata.full_type();
        full_type == "ASSET FUNCTION LEAF" || full_type == "PRODUCT FUNCTION LEAF"
    }

    pub fn is_function_node(&self) -> bool {
        let category = self.metadata.category.as_str();
        category != "PRODUCT" && category != "ASSET"
    }

    pub fn is_asset_function_node(&self) -> bool {
        self.metadata.category == "ASSET FUNCTION"
    }

    pub fn is_product_selection(&self) -> bool {
        self.metadata.category == "PRODUCT" && self.metadata.node_type == "SELECTION"
    }

    pub fn is_product_type(&self) -> bool {
        self.metadata.category == "PRODUCT" && self.metadata.node_type == "TYPE"
    }

    pub fn is_asset(&self) -> bool {
        self.metadata.category == "ASSET"
            && (self.metadata.node_type == "TYPE" || self.metadata.node_type == "SELECTION")
    }

    pub fn is_function_composition(&self) -> bool {
        (self.metadata.category == "ASSET FUNCTION" || self.metadata.category == "PRODUCT FUNCTION")
            && self.metadata.node_type == "COMPOSITION"
    }

    /// Whether the node may carry a location.
    ///
    /// Function compositions are individualizable only when their code ends
    /// with `i`, they are the path terminal, or they belong to a location set.
    pub fn is_individualizable(&self, is_target_node: bool, is_in_set: bool) -> bool {
        let node_type = self.metadata.node_type.as_str();
        if node_type == "GROUP" || node_type == "SELECTION" {
            return false;
        }
        if self.is_product_type() {
            return false;
        }
        if self.metadata.category == "ASSET" && node_type == "TYPE" {
            return false;
        }
        if self.is_function_composition() {
            return self.code.ends_with('i') || is_in_set || is_target_node;
        }
        true
    }
}

/// Node types that act as hierarchy links during path resolution.
pub fn is_potential_parent(node_type: &str) -> bool {
    matches!(node_type, "SELECTION" | "GROUP" | "LEAF")
}

impl PartialEq for GmodNode {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.location == other.location
    }
}

impl Eq for GmodNode {}

impl Hash for GmodNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
        self.location.hash(state);
    }
}

impl Display for GmodNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}-{}", self.code, location),
            None => f.write_str(&self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{is_potential_parent, GmodNode, GmodNodeMetadata};
    use crate::model::vis_version::VisVersion;
    use std::collections::BTreeMap;

    fn node(code: &str, category: &str, node_type: &str) -> GmodNode {
        GmodNode::new(
            0,
            VisVersion::V3_4a,
            code,
            GmodNodeMetadata {
                category: category.to_string(),
                node_type: node_type.to_string(),
                name: code.to_string(),
                common_name: None,
                definition: None,
                common_definition: None,
                install_substructure: None,
                normal_assignment_names: BTreeMap::new(),
            },
        )
    }

    #[test]
    fn classification_predicates_follow_category_and_type() {
        let leaf = node("411.1", "ASSET FUNCTION", "LEAF");
        assert!(leaf.is_leaf_node());
        assert!(leaf.is_function_node());
        assert!(leaf.is_asset_function_node());

        let product = node("C101", "PRODUCT", "TYPE");
        assert!(product.is_product_type());
        assert!(!product.is_function_node());
        assert!(!product.is_individualizable(true, false));

        let selection = node("S90", "PRODUCT", "SELECTION");
        assert!(selection.is_product_selection());
        assert!(!selection.is_individualizable(false, false));
    }

    #[test]
    fn compositions_are_individualizable_only_in_specific_cases() {
        let composition = node("411", "ASSET FUNCTION", "COMPOSITION");
        assert!(!composition.is_individualizable(false, false));
        assert!(composition.is_individualizable(true, false));
        assert!(composition.is_individualizable(false, true));
        assert!(node("411i", "ASSET FUNCTION", "COMPOSITION").is_individualizable(false, false));
    }

    #[test]
    fn equality_uses_code_and_location_only() {
        let base = node("C101.31", "PRODUCT FUNCTION", "LEAF");
        let other = node("C101.31", "PRODUCT FUNCTION", "GROUP");
        assert_eq!(base, other);
        assert_eq!(base.to_string(), "C101.31");
        assert!(base.location().is_none());
    }

    #[test]
    fn potential_parent_types() {
        assert!(is_potential_parent("LEAF"));
        assert!(is_potential_parent("GROUP"));
        assert!(!is_potential_parent("COMPOSITION"));
    }
}
