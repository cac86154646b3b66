//! Local ID builder and the built identifier.

use crate::codebook::metadata_tag::MetadataTag;
use crate::codebook::name::CodebookName;
use crate::gmod::path::GmodPath;
use crate::local_id::{LocalIdError, LocalIdResult, NAMING_RULE};
use crate::model::vis_version::VisVersion;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Value-type builder; every step consumes and returns the builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalIdBuilder {
    vis_version: VisVersion,
    verbose_mode: bool,
    primary_item: Option<GmodPath>,
    secondary_item: Option<GmodPath>,
    metadata_tags: BTreeMap<CodebookName, MetadataTag>,
}

impl LocalIdBuilder {
    pub fn create(vis_version: VisVersion) -> Self {
        Self {
            vis_version,
            verbose_mode: false,
            primary_item: None,
            secondary_item: None,
            metadata_tags: BTreeMap::new(),
        }
    }

    pub fn vis_version(&self) -> VisVersion {
        self.vis_version
    }

    pub fn verbose_mode(&self) -> bool {
        self.verbose_mode
    }

    pub fn primary_item(&self) -> Option<&GmodPath> {
        self.primary_item.as_ref()
    }

    pub fn secondary_item(&self) -> Option<&GmodPath> {
        self.secondary_item.as_ref()
    }

    pub fn metadata_tag(&self, name: CodebookName) -> Option<&MetadataTag> {
        self.metadata_tags.get(&name)
    }

    /// Tags in canonical rendering order.
    pub fn metadata_tags(&self) -> impl Iterator<Item = &MetadataTag> {
        self.metadata_tags.values()
    }

    pub fn has_custom_tag(&self) -> bool {
        self.metadata_tags.values().any(MetadataTag::is_custom)
    }

    /// No items and no tags.
    pub fn is_empty(&self) -> bool {
        self.primary_item.is_none() && self.secondary_item.is_none() && self.metadata_tags.is_empty()
    }

    /// Has a primary item and at least one metadata tag.
    pub fn is_valid(&self) -> bool {
        self.primary_item.is_some() && !self.metadata_tags.is_empty()
    }

    pub fn with_verbose_mode(mut self, verbose_mode: bool) -> Self {
        self.verbose_mode = verbose_mode;
        self
    }

    /// Sets the primary item.
    ///
    /// # Errors
    /// - `InvalidComponent` when the path belongs to another release or the
    ///   current secondary item is one of its ancestors.
    pub fn with_primary_item(mut self, item: GmodPath) -> LocalIdResult<Self> {
        self.check_release("primary item", &item)?;
        if let Some(secondary) = &self.secondary_item {
            check_not_ancestor(secondary, &item)?;
        }
        self.primary_item = Some(item);
        Ok(self)
    }

    pub fn try_with_primary_item(self, item: Option<GmodPath>) -> Self {
        match item {
            Some(item) if self.accepts_primary(&item) => {
                let mut builder = self;
                builder.primary_item = Some(item);
                builder
            }
            _ => self,
        }
    }

    pub fn without_primary_item(mut self) -> Self {
        self.primary_item = None;
        self
    }

    /// Sets the secondary item.
    ///
    /// # Errors
    /// - `InvalidComponent` when no primary item is set, the path belongs to
    ///   another release or it is an ancestor of the primary item.
    pub fn with_secondary_item(mut self, item: GmodPath) -> LocalIdResult<Self> {
        self.check_release("secondary item", &item)?;
        let Some(primary) = &self.primary_item else {
            return Err(missing_primary(&item));
        };
        check_not_ancestor(&item, primary)?;
        self.secondary_item = Some(item);
        Ok(self)
    }

    pub fn try_with_secondary_item(self, item: Option<GmodPath>) -> Self {
        match item {
            Some(item) if self.accepts_secondary(&item) => {
                let mut builder = self;
                builder.secondary_item = Some(item);
                builder
            }
            _ => self,
        }
    }

    pub fn without_secondary_item(mut self) -> Self {
        self.secondary_item = None;
        self
    }

    /// Sets (or replaces) the tag of the tag's category.
    ///
    /// # Errors
    /// - `InvalidComponent` for categories that are not Local ID components.
    pub fn with_metadata_tag(mut self, tag: MetadataTag) -> LocalIdResult<Self> {
        if !tag.name().is_local_id_component() {
            return Err(LocalIdError::InvalidComponent(format!(
                "codebook {} is not a local id metadata tag",
                tag.name()
            )));
        }
        self.metadata_tags.insert(tag.name(), tag);
        Ok(self)
    }

    pub fn try_with_metadata_tag(mut self, tag: Option<MetadataTag>) -> Self {
        if let Some(tag) = tag.filter(|tag| tag.name().is_local_id_component()) {
            self.metadata_tags.insert(tag.name(), tag);
        }
        self
    }

    pub fn without_metadata_tag(mut self, name: CodebookName) -> Self {
        self.metadata_tags.remove(&name);
        self
    }

    /// Freezes the builder into a [`LocalId`].
    ///
    /// # Errors
    /// - `EmptyLocalId` when neither a primary item nor a tag is set.
    /// - `InvalidComponent` when a secondary item is set without a primary
    ///   item.
    pub fn build(self) -> LocalIdResult<LocalId> {
        if self.primary_item.is_none() && self.metadata_tags.is_empty() {
            return Err(LocalIdError::EmptyLocalId);
        }
        if let (None, Some(secondary)) = (&self.primary_item, &self.secondary_item) {
            return Err(missing_primary(secondary));
        }
        Ok(LocalId { builder: self })
    }

    /// Verbose description segments, each without its trailing `/`.
    pub fn item_descriptions(&self) -> Vec<String> {
        let mut descriptions = Vec::new();
        if let Some(primary) = &self.primary_item {
            descriptions.extend(primary.verbose_names().into_iter().map(|name| format!("~{name}")));
        }
        if let Some(secondary) = &self.secondary_item {
            for (index, name) in secondary.verbose_names().into_iter().enumerate() {
                if index == 0 {
                    descriptions.push(format!("~for.{name}"));
                } else {
                    descriptions.push(format!("~{name}"));
                }
            }
        }
        descriptions
    }

    fn check_release(&self, component: &str, item: &GmodPath) -> LocalIdResult<()> {
        if item.vis_version() != self.vis_version {
            return Err(LocalIdError::InvalidComponent(format!(
                "{component} `{item}` is from vis version {}, builder uses {}",
                item.vis_version(),
                self.vis_version
            )));
        }
        Ok(())
    }

    fn accepts_primary(&self, item: &GmodPath) -> bool {
        self.check_release("primary item", item).is_ok()
            && self
                .secondary_item
                .as_ref()
                .map_or(true, |secondary| check_not_ancestor(secondary, item).is_ok())
    }

    fn accepts_secondary(&self, item: &GmodPath) -> bool {
        self.check_release("secondary item", item).is_ok()
            && self
                .primary_item
                .as_ref()
                .is_some_and(|primary| check_not_ancestor(item, primary).is_ok())
    }
}

fn missing_primary(secondary: &GmodPath) -> LocalIdError {
    LocalIdError::InvalidComponent(format!(
        "secondary item `{secondary}` requires a primary item"
    ))
}

/// Rejects `secondary` when its nodes form a strict prefix of `primary`.
fn check_not_ancestor(secondary: &GmodPath, primary: &GmodPath) -> LocalIdResult<()> {
    let is_ancestor = secondary.len() < primary.len()
        && secondary
            .full_path()
            .zip(primary.full_path())
            .all(|((_, a), (_, b))| a == b);
    if is_ancestor {
        return Err(LocalIdError::InvalidComponent(format!(
            "secondary item `{secondary}` is an ancestor of primary item `{primary}`"
        )));
    }
    Ok(())
}

impl Display for LocalIdBuilder {
    /// Canonical form, e.g. `/dnv-v2/vis-3-4a/411.1/C101.31-2/meta/qty-temperature`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{NAMING_RULE}/vis-{}/", self.vis_version)?;
        if let Some(primary) = &self.primary_item {
            write!(f, "{primary}/")?;
        }
        if let Some(secondary) = &self.secondary_item {
            write!(f, "sec/{secondary}/")?;
        }
        if self.verbose_mode {
            for description in self.item_descriptions() {
                write!(f, "{description}/")?;
            }
        }
        write!(f, "meta")?;
        for tag in self.metadata_tags.values() {
            write!(f, "/{tag}")?;
        }
        Ok(())
    }
}

/// A built, immutable Local ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalId {
    builder: LocalIdBuilder,
}

impl LocalId {
    pub fn builder(&self) -> &LocalIdBuilder {
        &self.builder
    }

    pub fn into_builder(self) -> LocalIdBuilder {
        self.builder
    }

    pub fn vis_version(&self) -> VisVersion {
        self.builder.vis_version()
    }

    pub fn verbose_mode(&self) -> bool {
        self.builder.verbose_mode()
    }

    pub fn primary_item(&self) -> Option<&GmodPath> {
        self.builder.primary_item()
    }

    pub fn secondary_item(&self) -> Option<&GmodPath> {
        self.builder.secondary_item()
    }

    pub fn metadata_tag(&self, name: CodebookName) -> Option<&MetadataTag> {
        self.builder.metadata_tag(name)
    }

    pub fn metadata_tags(&self) -> impl Iterator<Item = &MetadataTag> {
        self.builder.metadata_tags()
    }

    pub fn has_custom_tag(&self) -> bool {
        self.builder.has_custom_tag()
    }
}

impl Display for LocalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.builder)
    }
}
