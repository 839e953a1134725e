//! Unit catalog - categories, units, formulas and abbreviations
//!
//! Each unit stores one formula per *other* unit of its category, in
//! category order with its own slot left out. For `[A, B, C]`:
//! `A = [A->B, A->C]`, `B = [B->A, B->C]`, `C = [C->A, C->B]`.
//!
//! The catalog is built once and never mutated; every component borrows it.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tracing::{debug, warn};
use unitconv_core::{codes, Formula};

/// Errors from loading or validating a dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed dataset: {0}")]
    Malformed(String),

    #[error("category '{category}': unit '{unit}' has {found} formulas, expected {expected}")]
    FormulaCount {
        category: String,
        unit: String,
        expected: usize,
        found: usize,
    },

    #[error("dataset contains no categories")]
    Empty,
}

impl DatasetError {
    /// Every dataset failure stops startup the same way
    pub fn code(&self) -> &'static str {
        codes::DATASET_UNAVAILABLE
    }
}

/// A user token matched to a catalog unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUnit {
    pub name: String,
    pub category: String,
}

impl ResolvedUnit {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        ResolvedUnit {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// A unit and its outgoing formulas (`None` = no formula for that target)
#[derive(Debug, Clone, PartialEq)]
pub struct UnitEntry {
    pub name: String,
    pub formulas: Vec<Option<Formula>>,
}

/// A set of mutually convertible units, in catalog order
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub units: Vec<UnitEntry>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Category {
            name: name.into(),
            units: Vec::new(),
        }
    }

    /// Builder: append a unit with formula sources. Sources that fail to
    /// parse are stored as missing.
    pub fn with_unit(mut self, name: impl Into<String>, formulas: &[Option<&str>]) -> Self {
        let name = name.into();
        let formulas = formulas
            .iter()
            .map(|source| source.and_then(|s| parse_formula(&self.name, &name, s)))
            .collect();
        self.units.push(UnitEntry { name, formulas });
        self
    }

    /// Position of a unit by exact name
    pub fn position(&self, unit: &str) -> Option<usize> {
        self.units.iter().position(|u| u.name == unit)
    }

    pub fn unit(&self, unit: &str) -> Option<&UnitEntry> {
        self.units.iter().find(|u| u.name == unit)
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.iter().map(|u| u.name.as_str())
    }
}

fn parse_formula(category: &str, unit: &str, source: &str) -> Option<Formula> {
    match Formula::parse(source) {
        Ok(formula) => Some(formula),
        Err(e) => {
            warn!(category, unit, formula = source, error = %e, "formula rejected, treating as unavailable");
            None
        }
    }
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(rename = "unit types")]
    unit_types: Map<String, JsonValue>,
    #[serde(default)]
    abbreviations: Map<String, JsonValue>,
}

/// Read-only catalog of categories, units and abbreviations
#[derive(Debug, Clone)]
pub struct UnitCatalog {
    categories: Vec<Category>,
    abbreviations: Vec<(String, String)>,
    /// lowercase unit name -> (category index, unit index), first category wins
    unit_index: HashMap<String, (usize, usize)>,
    /// lowercase category name -> category index
    category_index: HashMap<String, usize>,
    /// abbreviation (case-sensitive) -> index into `abbreviations`
    abbreviation_index: HashMap<String, usize>,
}

impl UnitCatalog {
    /// Build a catalog, checking the per-unit formula count invariant
    pub fn new(
        categories: Vec<Category>,
        abbreviations: Vec<(String, String)>,
    ) -> Result<Self, DatasetError> {
        if categories.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut unit_index = HashMap::new();
        let mut category_index = HashMap::new();

        for (ci, category) in categories.iter().enumerate() {
            let key = category.name.to_lowercase();
            if let Some(&first) = category_index.get(&key) {
                let first: &Category = &categories[first];
                if first.name == category.name {
                    return Err(DatasetError::Malformed(format!("duplicate category '{}'", category.name)));
                }
                warn!(category = %category.name, shadowed_by = %first.name, "category differs only in case, lookups use the first");
            } else {
                category_index.insert(key, ci);
            }

            let expected = category.units.len().saturating_sub(1);
            let mut seen = HashSet::new();
            for (ui, unit) in category.units.iter().enumerate() {
                if !seen.insert(unit.name.as_str()) {
                    return Err(DatasetError::Malformed(format!(
                        "duplicate unit '{}' in category '{}'", unit.name, category.name
                    )));
                }
                if unit.formulas.len() != expected {
                    return Err(DatasetError::FormulaCount {
                        category: category.name.clone(),
                        unit: unit.name.clone(),
                        expected,
                        found: unit.formulas.len(),
                    });
                }
                unit_index.entry(unit.name.to_lowercase()).or_insert((ci, ui));
            }
        }

        let mut abbreviation_index = HashMap::new();
        for (i, (abbreviation, fullform)) in abbreviations.iter().enumerate() {
            if !unit_index.contains_key(&fullform.to_lowercase()) {
                warn!(abbreviation = %abbreviation, fullform = %fullform, "abbreviation points at unknown unit");
            }
            abbreviation_index.entry(abbreviation.clone()).or_insert(i);
        }

        debug!(
            categories = categories.len(),
            units = unit_index.len(),
            abbreviations = abbreviations.len(),
            "unit catalog built"
        );

        Ok(UnitCatalog {
            categories,
            abbreviations,
            unit_index,
            category_index,
            abbreviation_index,
        })
    }

    /// Parse a dataset document: `{"unit types": {...}, "abbreviations": {...}}`
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let raw: RawDataset = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    /// Load a dataset file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    fn from_raw(raw: RawDataset) -> Result<Self, DatasetError> {
        let mut categories = Vec::with_capacity(raw.unit_types.len());

        for (category_name, units) in raw.unit_types {
            let units = match units {
                JsonValue::Object(units) => units,
                other => {
                    return Err(DatasetError::Malformed(format!(
                        "category '{}' must be an object, got {}", category_name, json_type(&other)
                    )))
                }
            };

            let mut category = Category::new(category_name);
            for (unit_name, formulas) in units {
                let sources: Vec<Option<String>> = serde_json::from_value(formulas).map_err(|e| {
                    DatasetError::Malformed(format!(
                        "unit '{}' in '{}': formulas must be strings or null ({})",
                        unit_name, category.name, e
                    ))
                })?;
                let formulas = sources
                    .iter()
                    .map(|source| source.as_deref().and_then(|s| parse_formula(&category.name, &unit_name, s)))
                    .collect();
                category.units.push(UnitEntry { name: unit_name, formulas });
            }
            categories.push(category);
        }

        let mut abbreviations = Vec::with_capacity(raw.abbreviations.len());
        for (abbreviation, fullform) in raw.abbreviations {
            match fullform {
                JsonValue::String(fullform) => abbreviations.push((abbreviation, fullform)),
                other => {
                    return Err(DatasetError::Malformed(format!(
                        "abbreviation '{}' must map to a string, got {}", abbreviation, json_type(&other)
                    )))
                }
            }
        }

        Self::new(categories, abbreviations)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Category by exact name
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Category by case-insensitive name
    pub fn find_category(&self, name: &str) -> Option<&Category> {
        self.category_index
            .get(&name.to_lowercase())
            .map(|&i| &self.categories[i])
    }

    /// Case-insensitive unit lookup across all categories
    pub fn find_unit(&self, name: &str) -> Option<ResolvedUnit> {
        self.unit_index.get(&name.to_lowercase()).map(|&(ci, ui)| {
            let category = &self.categories[ci];
            ResolvedUnit::new(&category.units[ui].name, &category.name)
        })
    }

    /// Name of the first category holding `unit`
    pub fn category_of(&self, unit: &str) -> Option<&str> {
        self.unit_index
            .get(&unit.to_lowercase())
            .map(|&(ci, _)| self.categories[ci].name.as_str())
    }

    /// Full unit name for an abbreviation (case-sensitive)
    pub fn expand_abbreviation(&self, abbreviation: &str) -> Option<&str> {
        self.abbreviation_index
            .get(abbreviation)
            .map(|&i| self.abbreviations[i].1.as_str())
    }

    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.abbreviation_index.contains_key(word)
    }

    pub fn abbreviations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.abbreviations.iter().map(|(a, f)| (a.as_str(), f.as_str()))
    }

    /// Words offered as unit suggestions: abbreviations and their full
    /// names in table order, then remaining catalog units. No duplicates.
    pub fn suggestion_pool(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let abbreviated = self.abbreviations.iter().flat_map(|(a, f)| [a.as_str(), f.as_str()]);
        let units = self.categories.iter().flat_map(|c| c.unit_names());

        abbreviated
            .chain(units)
            .filter(|word| seen.insert(*word))
            .collect()
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
