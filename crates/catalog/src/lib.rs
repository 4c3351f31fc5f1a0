//! Static table of place categories the sessions draw from.
//!
//! The catalog is loaded once at startup, either from the built-in table or
//! from a TOML file, validated, and never mutated afterwards.

use std::{collections::HashSet, fs, path::Path};

use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use shared::domain::Place;
use thiserror::Error;
use tracing::debug;

mod builtin;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("category label must not be empty")]
    EmptyLabel,
    #[error("duplicate category label '{0}'")]
    DuplicateLabel(String),
    #[error("place in category '{0}' has an empty name")]
    UnnamedPlace(String),
    #[error("place '{place}' in category '{category}' has out of range coordinates")]
    CoordsOutOfRange { category: String, place: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Category {
    pub label: String,
    #[serde(default)]
    pub places: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self {
            categories: builtin::categories(),
        }
    }

    pub fn from_categories(categories: Vec<Category>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut categories = categories;
        for category in &mut categories {
            let label = category.label.trim();
            if label.is_empty() {
                return Err(CatalogError::EmptyLabel);
            }
            if !seen.insert(label.to_string()) {
                return Err(CatalogError::DuplicateLabel(label.to_string()));
            }
            for place in &mut category.places {
                if place.name.trim().is_empty() {
                    return Err(CatalogError::UnnamedPlace(category.label.clone()));
                }
                if !place.coords.is_in_range() {
                    return Err(CatalogError::CoordsOutOfRange {
                        category: category.label.clone(),
                        place: place.name.clone(),
                    });
                }
                if place.url.as_deref().is_some_and(|url| url.trim().is_empty()) {
                    place.url = None;
                }
            }
        }
        Ok(Self { categories })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw)?;
        Self::from_categories(file.categories)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_toml_str(&raw)?;
        debug!(
            path = %path.display(),
            categories = catalog.categories.len(),
            "loaded catalog file"
        );
        Ok(catalog)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|category| category.label.as_str())
    }

    /// Places listed under `label`, or `None` when the label is unknown.
    pub fn places(&self, label: &str) -> Option<&[Place]> {
        self.categories
            .iter()
            .find(|category| category.label == label)
            .map(|category| category.places.as_slice())
    }

    pub fn all_places(&self) -> impl Iterator<Item = &Place> {
        self.categories
            .iter()
            .flat_map(|category| category.places.iter())
    }

    pub fn place_count(&self) -> usize {
        self.categories
            .iter()
            .map(|category| category.places.len())
            .sum()
    }

    /// Uniform pick across every place in every category.
    pub fn random_place<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Place> {
        let total = self.place_count();
        if total == 0 {
            return None;
        }
        let index = rng.gen_range(0..total);
        self.all_places().nth(index)
    }

    /// Uniform pick within one category; `None` for an unknown or empty category.
    pub fn random_in<R: Rng + ?Sized>(&self, label: &str, rng: &mut R) -> Option<&Place> {
        self.places(label)?.choose(rng)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
