//! Incremental assembly of item drafts.
//!
//! [`ItemBuilder`] accumulates the parts of a [`FullItem`] and checks the
//! invariants a draft has to satisfy before the server will accept it:
//!
//! - a category is set, and it is a known one;
//! - section labels are unique by their slug (lower-cased, transliterated to
//!   ASCII). The first label given for a slug is the one kept;
//! - at most one URL is primary, and the last URL added as primary wins;
//! - a field's recipe is validated only when the field asks for generation,
//!   and is dropped otherwise.
//!
//! [`ItemBuilder::build`] moves the draft out and leaves the builder pristine,
//! so one builder can produce any number of independent items.

use std::collections::HashMap;
use std::mem;

use tracing::debug;

use crate::errors::ValidationError;
use crate::identifiers::{SectionId, VaultId};
use crate::records::{
    CharacterSet, Field, FieldPurpose, FieldType, FullItem, GeneratorRecipe, ItemCategory,
    ItemUrl, Section, SectionRef, VaultRef,
};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Description of a field to add to an item.
///
/// Everything is optional. Unset type means [`FieldType::String`], unset
/// purpose means [`FieldPurpose::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSpec {
    pub value: Option<String>,
    pub field_type: Option<FieldType>,
    pub purpose: Option<FieldPurpose>,
    pub label: Option<String>,
    /// Label of the section to place the field in; created if missing.
    pub section_name: Option<String>,
    pub generate: bool,
    /// Ignored unless `generate` is set.
    pub recipe: Option<RecipeSpec>,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    #[must_use]
    pub fn purpose(mut self, purpose: FieldPurpose) -> Self {
        self.purpose = Some(purpose);
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn section_name(mut self, section_name: impl Into<String>) -> Self {
        self.section_name = Some(section_name.into());
        self
    }

    /// Asks the server to generate the value, optionally following `recipe`.
    #[must_use]
    pub fn generate(mut self, recipe: Option<RecipeSpec>) -> Self {
        self.generate = true;
        self.recipe = recipe;
        self
    }
}

/// Unvalidated generator parameters.
///
/// Character sets are plain strings here; [`ItemBuilder::add_field`] checks
/// them against [`CharacterSet`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeSpec {
    pub length: Option<u32>,
    pub character_sets: Vec<String>,
    pub exclude_characters: Option<String>,
}

impl RecipeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub fn character_set(mut self, set: impl Into<String>) -> Self {
        self.character_sets.push(set.into());
        self
    }

    #[must_use]
    pub fn exclude_characters(mut self, characters: impl Into<String>) -> Self {
        self.exclude_characters = Some(characters.into());
        self
    }

    /// Deduplicates and checks the recipe.
    ///
    /// An empty character-set list is valid (the server picks).
    fn validate(self, label: Option<&str>) -> Result<GeneratorRecipe, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidRecipe {
            label: label.map(str::to_owned),
            reason,
        };

        let mut names: Vec<String> = Vec::with_capacity(self.character_sets.len());
        for name in self.character_sets {
            if !names.contains(&name) {
                names.push(name);
            }
        }

        if names.len() > CharacterSet::KNOWN.len() {
            return Err(invalid(format!(
                "{} character sets given, at most {} exist",
                names.len(),
                CharacterSet::KNOWN.len()
            )));
        }

        let character_sets = names
            .iter()
            .map(|name| {
                name.parse::<CharacterSet>()
                    .map_err(|_| invalid(format!("unknown character set '{name}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_characters = self.exclude_characters.map(|chars| {
            let mut seen = Vec::new();
            chars
                .chars()
                .filter(|c| {
                    if seen.contains(c) {
                        false
                    } else {
                        seen.push(*c);
                        true
                    }
                })
                .collect::<String>()
        });

        Ok(GeneratorRecipe {
            length: self.length,
            character_sets,
            exclude_characters,
        })
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct UrlAccumulator {
    entries: Vec<ItemUrl>,
    primary_href: Option<String>,
}

/// Stateful builder for new items.
///
/// ```
/// use domain::builder::{FieldSpec, ItemBuilder};
/// use domain::records::{FieldPurpose, FieldType};
///
/// let item = ItemBuilder::new()
///     .set_category("LOGIN")?
///     .set_title("Example")
///     .add_field(
///         FieldSpec::new()
///             .label("password")
///             .field_type(FieldType::Concealed)
///             .purpose(FieldPurpose::Password)
///             .value("hunter2"),
///     )?
///     .build()?;
/// assert_eq!(item.fields.len(), 1);
/// # Ok::<(), domain::errors::ValidationError>(())
/// ```
#[derive(Debug, Default)]
pub struct ItemBuilder {
    draft: FullItem,
    /// slug -> position in `sections`.
    section_index: HashMap<String, usize>,
    sections: Vec<Section>,
    urls: UrlAccumulator,
}

impl ItemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards everything accumulated so far.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    /// Sets the owning vault.
    ///
    /// Mostly useful for drafts passed around before a vault is chosen; item
    /// creation stamps the target vault anyway.
    pub fn set_vault(&mut self, vault_id: VaultId) -> &mut Self {
        self.draft.vault = Some(VaultRef::new(vault_id));
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.draft.title = Some(title.into());
        self
    }

    /// Appends a tag verbatim. Duplicates are kept.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.draft.tags.push(tag.into());
        self
    }

    /// Flips the favorite flag. An unset flag becomes `true`.
    pub fn toggle_favorite(&mut self) -> &mut Self {
        self.draft.favorite = Some(!self.draft.favorite.unwrap_or(false));
        self
    }

    /// Sets the category from its wire name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCategory`] if `category` is not a
    /// known category.
    pub fn set_category(&mut self, category: impl AsRef<str>) -> Result<&mut Self, ValidationError> {
        let raw = category.as_ref();
        let parsed = raw
            .parse::<ItemCategory>()
            .map_err(|_| ValidationError::InvalidCategory {
                value: raw.to_owned(),
            })?;
        self.draft.category = Some(parsed);
        Ok(self)
    }

    /// Adds a section unless one with the same slug exists.
    pub fn add_section(&mut self, label: &str) -> &mut Self {
        self.section_for(label);
        self
    }

    /// Appends a field.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRecipe`] if the field asks for
    /// generation with a recipe that names unknown or too many character sets.
    /// Nothing is changed on error.
    pub fn add_field(&mut self, spec: FieldSpec) -> Result<&mut Self, ValidationError> {
        let recipe = match (spec.generate, spec.recipe) {
            (true, Some(recipe)) => Some(recipe.validate(spec.label.as_deref())?),
            _ => None,
        };

        let section = spec
            .section_name
            .as_deref()
            .map(|name| SectionRef { id: self.section_for(name) });

        self.draft.fields.push(Field {
            section,
            field_type: Some(spec.field_type.unwrap_or(FieldType::String)),
            purpose: Some(spec.purpose.unwrap_or(FieldPurpose::Empty)),
            label: spec.label,
            value: spec.value,
            generate: Some(spec.generate),
            recipe,
            ..Field::default()
        });
        Ok(self)
    }

    /// Appends a URL. If it is marked primary it replaces any earlier primary.
    ///
    /// A primary flag on a URL without an address is ignored; it can neither
    /// become primary nor displace the current primary.
    pub fn add_url(&mut self, url: ItemUrl) -> &mut Self {
        if let (true, Some(href)) = (url.is_primary(), url.href.as_ref()) {
            self.urls.primary_href = Some(href.clone());
        }
        self.urls.entries.push(url);
        self
    }

    /// Finishes the draft and resets the builder.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingCategory`] if no category was set. The
    /// builder keeps its state in that case.
    pub fn build(&mut self) -> Result<FullItem, ValidationError> {
        if self.draft.category.is_none() {
            return Err(ValidationError::MissingCategory);
        }

        let mut item = mem::take(&mut self.draft);
        item.sections = mem::take(&mut self.sections);

        let urls = mem::take(&mut self.urls);
        let primary = urls.primary_href;
        item.urls = urls
            .entries
            .into_iter()
            .map(|mut url| {
                let is_primary = primary.is_some() && url.href == primary;
                url.primary = is_primary.then_some(true);
                url
            })
            .collect();

        self.reset();
        debug!(
            title = item.title.as_deref().unwrap_or_default(),
            fields = item.fields.len(),
            sections = item.sections.len(),
            "built item"
        );
        Ok(item)
    }

    fn section_for(&mut self, label: &str) -> Option<SectionId> {
        let key = section_key(label);
        if let Some(&position) = self.section_index.get(&key) {
            return self.sections[position].id.clone();
        }
        let id = SectionId::generate();
        self.section_index.insert(key, self.sections.len());
        self.sections.push(Section {
            id: Some(id.clone()),
            label: Some(label.to_owned()),
        });
        Some(id)
    }
}

/// Dedup key for a section label: its slug, or the lower-cased label when
/// the slug comes out empty.
fn section_key(label: &str) -> String {
    let slug = slug::slugify(label);
    if slug.is_empty() {
        format!("~{}", label.to_lowercase())
    } else {
        slug
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
