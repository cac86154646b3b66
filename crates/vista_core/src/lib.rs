//! Core domain logic for VIS taxonomy paths and Local IDs.
//! This crate validates, parses, renders and converts identifiers against
//! immutable, release-scoped taxonomy data; it performs no I/O of its own.

pub mod codebook;
pub mod gmod;
pub mod local_id;
pub mod logging;
pub mod model;
pub mod versioning;
pub mod vis;

pub use codebook::metadata_tag::{MetadataTag, TagValue};
pub use codebook::name::{CodebookName, LOCAL_ID_CODEBOOKS};
pub use codebook::{
    Codebook, CodebookDto, CodebookError, CodebookResult, Codebooks, CodebooksDto,
    PositionValidationResult,
};
pub use gmod::parser::PathParseOptions;
pub use gmod::path::{
    CommonName, GmodPath, GmodPathError, GmodPathResult, IndividualizableSet, MissingLink,
};
pub use gmod::traversal::{
    TraversalBudgetExhausted, TraversalControl, TraversalOptions, TraversalOutcome,
};
pub use gmod::{Gmod, GmodDto, GmodError, GmodNodeDto, GmodResult};
pub use local_id::builder::{LocalId, LocalIdBuilder};
pub use local_id::parsing::{LocalIdParsingState, ParsingError, ParsingErrors};
pub use local_id::{LocalIdError, LocalIdResult, NAMING_RULE};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::gmod_node::{is_potential_parent, GmodNode, GmodNodeMetadata};
pub use model::location::{
    Location, LocationError, LocationGroup, LocationValidationResult, Locations, LocationsDto,
    RelativeLocation, RelativeLocationDto,
};
pub use model::vis_version::{VisVersion, VisVersionError};
pub use versioning::{
    ConversionError, ConversionResult, GmodVersioning, GmodVersioningDto, NodeChange,
    NodeChangeDto, VersionedCode,
};
pub use vis::{TaxonomyStore, Vis, VisError, VisResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
