//! Value types shared by the taxonomy, codebook and identifier layers.
//!
//! # Responsibility
//! - Define release identifiers, taxonomy nodes and locations.
//! - Keep these types free of lookups into a loaded taxonomy.
//!
//! # Invariants
//! - Every value here is immutable once constructed.

pub mod gmod_node;
pub mod location;
pub mod vis_version;
