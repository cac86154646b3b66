//! In-memory registry of loaded taxonomy releases.
//!
//! # Responsibility
//! - Hold, per release, the taxonomy, codebooks and location vocabulary as
//!   shared immutable data.
//! - Offer release-addressed parsing and conversion entry points.
//!
//! # Invariants
//! - The three datasets of one release always share the same `VisVersion`.
//! - Registered data is never mutated; handles are cheap `Arc` clones safe
//!   to share across threads.
//!
//! # See also
//! - `local_id::parser` for the main consumer of [`TaxonomyStore`].

use crate::codebook::{CodebookError, Codebooks, CodebooksDto};
use crate::gmod::path::{GmodPath, GmodPathError};
use crate::gmod::{Gmod, GmodDto, GmodError};
use crate::local_id::builder::LocalId;
use crate::model::gmod_node::GmodNode;
use crate::model::location::{LocationError, Locations, LocationsDto};
use crate::model::vis_version::VisVersion;
use crate::versioning::{ConversionError, ConversionResult, GmodVersioning};
use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Release-scoped data lookups the parsers and converters depend on.
pub trait TaxonomyStore {
    fn gmod(&self, version: VisVersion) -> Option<&Gmod>;
    fn codebooks(&self, version: VisVersion) -> Option<&Codebooks>;
    fn locations(&self, version: VisVersion) -> Option<&Locations>;
    fn versioning(&self) -> Option<&GmodVersioning>;
}

/// Result type used by the registry.
pub type VisResult<T> = Result<T, VisError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisError {
    VersionNotLoaded(VisVersion),
    DuplicateVersion(VisVersion),
    /// Datasets handed to one registration belong to different releases.
    VersionMismatch {
        expected: VisVersion,
        found: VisVersion,
    },
    Gmod(GmodError),
    Codebook(CodebookError),
    Location(LocationError),
    Path(GmodPathError),
}

impl Display for VisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VersionNotLoaded(version) => write!(f, "vis version {version} is not loaded"),
            Self::DuplicateVersion(version) => {
                write!(f, "vis version {version} is already registered")
            }
            Self::VersionMismatch { expected, found } => {
                write!(f, "dataset belongs to {found}, expected {expected}")
            }
            Self::Gmod(err) => write!(f, "{err}"),
            Self::Codebook(err) => write!(f, "{err}"),
            Self::Location(err) => write!(f, "{err}"),
            Self::Path(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VisError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Gmod(err) => Some(err),
            Self::Codebook(err) => Some(err),
            Self::Location(err) => Some(err),
            Self::Path(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GmodError> for VisError {
    fn from(value: GmodError) -> Self {
        Self::Gmod(value)
    }
}

impl From<CodebookError> for VisError {
    fn from(value: CodebookError) -> Self {
        Self::Codebook(value)
    }
}

impl From<LocationError> for VisError {
    fn from(value: LocationError) -> Self {
        Self::Location(value)
    }
}

impl From<GmodPathError> for VisError {
    fn from(value: GmodPathError) -> Self {
        Self::Path(value)
    }
}

#[derive(Debug, Clone)]
struct Release {
    gmod: Arc<Gmod>,
    codebooks: Arc<Codebooks>,
    locations: Arc<Locations>,
}

/// Loaded releases plus the change tables between them.
#[derive(Debug, Clone, Default)]
pub struct Vis {
    releases: BTreeMap<VisVersion, Release>,
    versioning: Option<Arc<GmodVersioning>>,
}

impl Vis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one release.
    ///
    /// # Errors
    /// - `VersionMismatch` when the datasets disagree on their release.
    /// - `DuplicateVersion` when the release is already registered.
    pub fn register(
        &mut self,
        gmod: Gmod,
        codebooks: Codebooks,
        locations: Locations,
    ) -> VisResult<()> {
        let version = gmod.vis_version();
        for found in [codebooks.vis_version(), locations.vis_version()] {
            if found != version {
                return Err(VisError::VersionMismatch {
                    expected: version,
                    found,
                });
            }
        }
        if self.releases.contains_key(&version) {
            return Err(VisError::DuplicateVersion(version));
        }
        info!(
            "event=vis_register module=vis status=ok vis_version={} nodes={}",
            version,
            gmod.len()
        );
        self.releases.insert(
            version,
            Release {
                gmod: Arc::new(gmod),
                codebooks: Arc::new(codebooks),
                locations: Arc::new(locations),
            },
        );
        Ok(())
    }

    /// Builds and registers one release from its wire datasets.
    pub fn register_dto(
        &mut self,
        version: VisVersion,
        gmod: &GmodDto,
        codebooks: &CodebooksDto,
        locations: &LocationsDto,
    ) -> VisResult<()> {
        let gmod = Gmod::from_dto(version, gmod)?;
        let codebooks = Codebooks::from_dto(version, codebooks)?;
        let locations = Locations::from_dto(version, locations)?;
        self.register(gmod, codebooks, locations)
    }

    pub fn set_versioning(&mut self, versioning: GmodVersioning) {
        self.versioning = Some(Arc::new(versioning));
    }

    /// Registered releases, oldest first.
    pub fn versions(&self) -> impl Iterator<Item = VisVersion> + '_ {
        self.releases.keys().copied()
    }

    pub fn gmod_handle(&self, version: VisVersion) -> VisResult<Arc<Gmod>> {
        self.release(version).map(|release| Arc::clone(&release.gmod))
    }

    pub fn codebooks_handle(&self, version: VisVersion) -> VisResult<Arc<Codebooks>> {
        self.release(version)
            .map(|release| Arc::clone(&release.codebooks))
    }

    pub fn locations_handle(&self, version: VisVersion) -> VisResult<Arc<Locations>> {
        self.release(version)
            .map(|release| Arc::clone(&release.locations))
    }

    pub fn parse_path(&self, item: &str, version: VisVersion) -> VisResult<GmodPath> {
        let release = self.release(version)?;
        Ok(release.gmod.parse_path(item, &release.locations)?)
    }

    pub fn try_parse_path(&self, item: &str, version: VisVersion) -> Option<GmodPath> {
        self.parse_path(item, version).ok()
    }

    pub fn parse_full_path(&self, item: &str, version: VisVersion) -> VisResult<GmodPath> {
        let release = self.release(version)?;
        Ok(release.gmod.parse_full_path(item, &release.locations)?)
    }

    pub fn try_parse_full_path(&self, item: &str, version: VisVersion) -> Option<GmodPath> {
        self.parse_full_path(item, version).ok()
    }

    /// Converts `node` from `source` to `target`.
    ///
    /// # Errors
    /// - `InvalidConversion` when a release or the change tables are not loaded.
    pub fn convert_node(
        &self,
        source: VisVersion,
        node: &GmodNode,
        target: VisVersion,
    ) -> ConversionResult<Option<GmodNode>> {
        let (versioning, _, target) = self.conversion_pair(source, target)?;
        versioning.convert_node(source, node, target)
    }

    pub fn convert_path(
        &self,
        source: VisVersion,
        path: &GmodPath,
        target: VisVersion,
    ) -> ConversionResult<Option<GmodPath>> {
        let (versioning, source, target) = self.conversion_pair(source, target)?;
        versioning.convert_path(source, path, target)
    }

    pub fn convert_local_id(
        &self,
        local_id: &LocalId,
        target: VisVersion,
    ) -> ConversionResult<Option<LocalId>> {
        let (versioning, source, target) = self.conversion_pair(local_id.vis_version(), target)?;
        versioning.convert_local_id(source, local_id, target)
    }

    fn release(&self, version: VisVersion) -> VisResult<&Release> {
        self.releases
            .get(&version)
            .ok_or(VisError::VersionNotLoaded(version))
    }

    fn conversion_pair(
        &self,
        source: VisVersion,
        target: VisVersion,
    ) -> ConversionResult<(&GmodVersioning, &Gmod, &Gmod)> {
        let versioning = self.versioning.as_deref().ok_or_else(|| {
            ConversionError::InvalidConversion("no version change tables loaded".to_string())
        })?;
        let lookup = |version: VisVersion| {
            self.gmod(version).ok_or_else(|| {
                ConversionError::InvalidConversion(format!("vis version {version} is not loaded"))
            })
        };
        Ok((versioning, lookup(source)?, lookup(target)?))
    }
}

impl TaxonomyStore for Vis {
    fn gmod(&self, version: VisVersion) -> Option<&Gmod> {
        self.releases.get(&version).map(|release| release.gmod.as_ref())
    }

    fn codebooks(&self, version: VisVersion) -> Option<&Codebooks> {
        self.releases
            .get(&version)
            .map(|release| release.codebooks.as_ref())
    }

    fn locations(&self, version: VisVersion) -> Option<&Locations> {
        self.releases
            .get(&version)
            .map(|release| release.locations.as_ref())
    }

    fn versioning(&self) -> Option<&GmodVersioning> {
        self.versioning.as_deref()
    }
}
