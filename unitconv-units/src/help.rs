//! Category help lookup

use serde::Serialize;
use tracing::debug;

use crate::catalog::UnitCatalog;
use crate::suggest::suggest;

/// Answer to a `help` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryHelp {
    /// All category names, in catalog order
    Categories { categories: Vec<String> },
    /// Units of the requested category
    Units { category: String, units: Vec<String> },
    /// The query was misspelled and had exactly one close category
    DidYouMean { suggested: String, units: Vec<String> },
    /// Candidate categories; empty when nothing came close
    Suggestions { query: String, candidates: Vec<String> },
}

impl UnitCatalog {
    /// List categories, or the units of one category.
    ///
    /// A misspelled category is corrected once when a single candidate
    /// exists; otherwise the candidates are returned for the caller to show.
    pub fn help(&self, query: Option<&str>) -> CategoryHelp {
        let query = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => q,
            None => {
                return CategoryHelp::Categories {
                    categories: self.category_names().map(str::to_string).collect(),
                }
            }
        };

        if let Some(category) = self.find_category(query) {
            return CategoryHelp::Units {
                category: category.name.clone(),
                units: category.unit_names().map(str::to_string).collect(),
            };
        }

        let mut candidates = suggest(self.category_names(), query);
        debug!(query, count = candidates.len(), "category suggestions");

        if candidates.len() == 1 {
            let suggested = candidates.remove(0);
            if let Some(category) = self.category(&suggested) {
                return CategoryHelp::DidYouMean {
                    units: category.unit_names().map(str::to_string).collect(),
                    suggested,
                };
            }
            candidates.push(suggested);
        }

        CategoryHelp::Suggestions {
            query: query.to_string(),
            candidates,
        }
    }
}
