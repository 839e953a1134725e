//! Query parsing - `value, unit` and `value, unit, unit`
//!
//! A unit token is resolved by trying, in order:
//! 1. exact unit name (case-insensitive)
//! 2. abbreviation (case-sensitive)
//! 3. spelling suggestions, auto-accepted when there is exactly one

use std::fmt;

use serde::Serialize;
use tracing::debug;
use unitconv_core::{parse_value, QueryError};

use crate::catalog::{ResolvedUnit, UnitCatalog};
use crate::suggest::suggest;

/// Field separator in a query
pub const SEPARATOR: char = ',';

/// Largest suggestion list shown to the user; more than this asks the user
/// to be more specific instead
pub const MAX_LISTED_SUGGESTIONS: usize = 8;

/// Value used when resolving the target unit, whose own value is ignored
const PLACEHOLDER_VALUE: &str = "1";

/// Something the resolver substituted for what was typed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// An abbreviation was expanded to its unit name
    Expanded { abbreviation: String, fullform: String },
    /// A misspelled token was replaced by its only suggestion
    Corrected { typed: String, used: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Expanded { abbreviation, fullform } => {
                write!(f, "Using '{}' for '{}'", fullform, abbreviation)
            }
            Notice::Corrected { typed, used } => {
                write!(f, "Showing result for '{}' instead of '{}'", used, typed)
            }
        }
    }
}

/// A value with its resolved unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub value: f64,
    pub unit: ResolvedUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

/// What a query asks for once all names are resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedQuery {
    /// `value, unit`: convert into every other unit of the category
    Single { value: f64, unit: ResolvedUnit },
    /// `value, from, to`: both units share a category
    Pair { value: f64, from: ResolvedUnit, to: ResolvedUnit },
}

impl ResolvedQuery {
    pub fn value(&self) -> f64 {
        match self {
            ResolvedQuery::Single { value, .. } | ResolvedQuery::Pair { value, .. } => *value,
        }
    }

    pub fn source(&self) -> &ResolvedUnit {
        match self {
            ResolvedQuery::Single { unit, .. } => unit,
            ResolvedQuery::Pair { from, .. } => from,
        }
    }
}

/// Parsed query plus any substitutions made along the way
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedQuery {
    pub query: ResolvedQuery,
    pub notices: Vec<Notice>,
}

/// Turns raw query text into resolved units
#[derive(Debug, Clone, Copy)]
pub struct QueryParser<'a> {
    catalog: &'a UnitCatalog,
}

impl<'a> QueryParser<'a> {
    pub fn new(catalog: &'a UnitCatalog) -> Self {
        QueryParser { catalog }
    }

    pub fn parse(&self, query: &str) -> Result<ParsedQuery, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::InputEmpty);
        }

        let fields: Vec<&str> = query.split(SEPARATOR).map(str::trim).collect();

        match fields.as_slice() {
            [_] => Err(QueryError::SeparatorMissing),
            [num, unit] => {
                let resolution = self.resolve_one(num, unit)?;
                Ok(ParsedQuery {
                    query: ResolvedQuery::Single {
                        value: resolution.value,
                        unit: resolution.unit,
                    },
                    notices: resolution.notice.into_iter().collect(),
                })
            }
            [num, unit, unit2] => self.parse_pair(num, unit, unit2),
            _ => Err(QueryError::TooManySeparators { count: fields.len() - 1 }),
        }
    }

    fn parse_pair(&self, num: &str, unit: &str, unit2: &str) -> Result<ParsedQuery, QueryError> {
        if unit.is_empty() {
            return Err(QueryError::UnitEmpty { position: 2 });
        }
        // The first unit must resolve before the second is looked at
        let source = self.resolve_one(num, unit)?;

        if unit2.is_empty() {
            return Err(QueryError::UnitEmpty { position: 3 });
        }
        let target = self.resolve_one(PLACEHOLDER_VALUE, unit2)?;

        if source.unit.category != target.unit.category {
            return Err(QueryError::CategoryMismatch {
                first: source.unit.category,
                second: target.unit.category,
            });
        }

        Ok(ParsedQuery {
            query: ResolvedQuery::Pair {
                value: source.value,
                from: source.unit,
                to: target.unit,
            },
            notices: source.notice.into_iter().chain(target.notice).collect(),
        })
    }

    /// Validate a value field and resolve a unit field
    pub fn resolve_one(&self, num_text: &str, unit_text: &str) -> Result<Resolution, QueryError> {
        let value = parse_value(num_text)?;

        let unit_text = unit_text.trim();
        if unit_text.is_empty() {
            return Err(QueryError::UnitEmpty { position: 2 });
        }

        let (unit, notice) = self.resolve_unit(unit_text)?;
        Ok(Resolution { value, unit, notice })
    }

    fn resolve_unit(&self, unit_text: &str) -> Result<(ResolvedUnit, Option<Notice>), QueryError> {
        if let Some(unit) = self.catalog.find_unit(unit_text) {
            debug!(unit = %unit.name, category = %unit.category, "unit matched by name");
            return Ok((unit, None));
        }

        if let Some(fullform) = self.catalog.expand_abbreviation(unit_text) {
            debug!(abbreviation = unit_text, fullform, "unit matched by abbreviation");
            let unit = self.find_fullform(fullform, unit_text)?;
            let notice = Notice::Expanded {
                abbreviation: unit_text.to_string(),
                fullform: unit.name.clone(),
            };
            return Ok((unit, Some(notice)));
        }

        let suggestions = suggest(self.catalog.suggestion_pool(), unit_text);
        debug!(query = unit_text, count = suggestions.len(), "unit suggestions");

        match suggestions.len() {
            0 => Err(QueryError::UnitInvalid { unit: unit_text.to_string() }),
            1 => {
                let used = &suggestions[0];
                let fullform = self.catalog.expand_abbreviation(used).unwrap_or(used);
                let unit = self.find_fullform(fullform, unit_text)?;
                let notice = Notice::Corrected {
                    typed: unit_text.to_string(),
                    used: used.clone(),
                };
                Ok((unit, Some(notice)))
            }
            count if count <= MAX_LISTED_SUGGESTIONS => Err(QueryError::AmbiguousUnit {
                unit: unit_text.to_string(),
                suggestions: self.prettify_suggestions(suggestions),
            }),
            count => Err(QueryError::TooManyMatches {
                unit: unit_text.to_string(),
                count,
            }),
        }
    }

    /// A full unit name from the abbreviation table that the catalog does
    /// not know is a data inconsistency; report the typed token as invalid.
    fn find_fullform(&self, fullform: &str, typed: &str) -> Result<ResolvedUnit, QueryError> {
        self.catalog
            .find_unit(fullform)
            .ok_or_else(|| QueryError::UnitInvalid { unit: typed.to_string() })
    }

    /// Show abbreviations together with their full name: `"foot (ft)"`.
    /// A bare full name that also appears this way is dropped.
    pub fn prettify_suggestions(&self, suggestions: Vec<String>) -> Vec<String> {
        let mut pretty = suggestions.clone();

        for word in &suggestions {
            let fullform = match self.catalog.expand_abbreviation(word) {
                Some(fullform) => fullform,
                None => continue,
            };
            pretty.retain(|w| w != word && w != fullform);
            pretty.push(format!("{} ({})", fullform, word));
        }

        pretty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{abc_catalog, sample_catalog};
    use crate::catalog::Category;

    fn parse(query: &str) -> Result<ParsedQuery, QueryError> {
        let catalog = sample_catalog();
        QueryParser::new(&catalog).parse(query)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("").unwrap_err(), QueryError::InputEmpty);
        assert_eq!(parse("   ").unwrap_err(), QueryError::InputEmpty);
    }

    #[test]
    fn test_separator_missing() {
        assert_eq!(parse("abc").unwrap_err(), QueryError::SeparatorMissing);
        assert_eq!(parse("4 km").unwrap_err(), QueryError::SeparatorMissing);
    }

    #[test]
    fn test_too_many_separators() {
        assert_eq!(parse("4, km, m, cm").unwrap_err(), QueryError::TooManySeparators { count: 3 });
        assert_eq!(parse(",,,,").unwrap_err(), QueryError::TooManySeparators { count: 4 });
    }

    #[test]
    fn test_value_errors() {
        assert_eq!(parse(", km").unwrap_err(), QueryError::ValueEmpty);
        assert_eq!(parse("four, km").unwrap_err(), QueryError::ValueInvalid { value: "four".to_string() });
    }

    #[test]
    fn test_value_checked_before_unit() {
        assert_eq!(parse("x,").unwrap_err(), QueryError::ValueInvalid { value: "x".to_string() });
        assert_eq!(parse("4,").unwrap_err(), QueryError::UnitEmpty { position: 2 });
    }

    #[test]
    fn test_single_by_name() {
        let parsed = parse("4, Kilometer").unwrap();
        assert_eq!(
            parsed.query,
            ResolvedQuery::Single { value: 4.0, unit: ResolvedUnit::new("kilometer", "length") }
        );
        assert!(parsed.notices.is_empty());
    }

    #[test]
    fn test_single_by_abbreviation() {
        let parsed = parse("4, km").unwrap();
        assert_eq!(parsed.query.source(), &ResolvedUnit::new("kilometer", "length"));
        assert_eq!(
            parsed.notices,
            vec![Notice::Expanded { abbreviation: "km".to_string(), fullform: "kilometer".to_string() }]
        );
    }

    #[test]
    fn test_name_match_beats_abbreviation() {
        // "A" is an abbreviation, but it also names unit "a" case-insensitively
        let catalog = abc_catalog();
        let parser = QueryParser::new(&catalog);
        let parsed = parser.parse("1, A").unwrap();
        assert_eq!(parsed.query.source(), &ResolvedUnit::new("a", "letters"));
        assert!(parsed.notices.is_empty());
    }

    #[test]
    fn test_misspelling_autocorrected() {
        let parsed = parse("4, kilometre").unwrap();
        assert_eq!(parsed.query.source(), &ResolvedUnit::new("kilometer", "length"));
        assert_eq!(
            parsed.notices,
            vec![Notice::Corrected { typed: "kilometre".to_string(), used: "kilometer".to_string() }]
        );
        assert_eq!(
            parsed.notices[0].to_string(),
            "Showing result for 'kilometer' instead of 'kilometre'"
        );
    }

    #[test]
    fn test_single_suggestion_that_is_abbreviation_expands() {
        let category = Category::new("length")
            .with_unit("foot", &[Some("n*12")])
            .with_unit("inch", &[Some("n/12")]);
        let catalog = UnitCatalog::new(
            vec![category],
            vec![("ft".to_string(), "foot".to_string())],
        ).unwrap();
        let parser = QueryParser::new(&catalog);

        // "fz" is one edit from "ft" and far from everything else
        let parsed = parser.parse("2, fz").unwrap();
        assert_eq!(parsed.query.source(), &ResolvedUnit::new("foot", "length"));
        assert_eq!(
            parsed.notices,
            vec![Notice::Corrected { typed: "fz".to_string(), used: "ft".to_string() }]
        );
    }

    #[test]
    fn test_ambiguous_unit_lists_suggestions() {
        let err = parse("4, kilo").unwrap_err();
        assert_eq!(
            err,
            QueryError::AmbiguousUnit {
                unit: "kilo".to_string(),
                suggestions: vec!["kilometer".to_string(), "kilogram".to_string()],
            }
        );
    }

    #[test]
    fn test_ambiguous_abbreviations_prettified() {
        let err = parse("4, kib").unwrap_err();
        match err {
            QueryError::AmbiguousUnit { suggestions, .. } => {
                assert_eq!(suggestions, vec!["kibibyte (KiB)", "kibibit (Kib)"]);
            }
            other => panic!("expected AmbiguousUnit, got {:?}", other),
        }
    }

    #[test]
    fn test_too_many_matches_reports_count() {
        // "k" appears in ten pool words
        let err = parse("4, k").unwrap_err();
        assert_eq!(err, QueryError::TooManyMatches { unit: "k".to_string(), count: 10 });
    }

    #[test]
    fn test_no_close_match_still_answers() {
        // Every one- and two-letter word ties, far more than can be listed
        let err = parse("4, qqq").unwrap_err();
        assert!(matches!(err, QueryError::TooManyMatches { count, .. } if count > MAX_LISTED_SUGGESTIONS));
    }

    fn shared_prefix_catalog(units: usize) -> UnitCatalog {
        let category = (0..units).fold(Category::new("numbered"), |category, i| {
            let formulas = vec![Some("n"); units - 1];
            category.with_unit(format!("zz{}", i), &formulas)
        });
        UnitCatalog::new(vec![category], vec![]).unwrap()
    }

    #[test]
    fn test_largest_listable_suggestion_set() {
        let catalog = shared_prefix_catalog(MAX_LISTED_SUGGESTIONS);
        let err = QueryParser::new(&catalog).parse("1, zz").unwrap_err();
        match err {
            QueryError::AmbiguousUnit { suggestions, .. } => {
                assert_eq!(suggestions.len(), MAX_LISTED_SUGGESTIONS);
                assert_eq!(suggestions[0], "zz0");
            }
            other => panic!("expected AmbiguousUnit, got {:?}", other),
        }
    }

    #[test]
    fn test_one_past_listable_reports_count() {
        let catalog = shared_prefix_catalog(MAX_LISTED_SUGGESTIONS + 1);
        assert_eq!(
            QueryParser::new(&catalog).parse("1, zz").unwrap_err(),
            QueryError::TooManyMatches { unit: "zz".to_string(), count: 9 }
        );
    }

    #[test]
    fn test_pair_query() {
        let parsed = parse("4, km, mile").unwrap();
        assert_eq!(
            parsed.query,
            ResolvedQuery::Pair {
                value: 4.0,
                from: ResolvedUnit::new("kilometer", "length"),
                to: ResolvedUnit::new("mile", "length"),
            }
        );
        assert_eq!(parsed.notices.len(), 1);
    }

    #[test]
    fn test_pair_notices_from_both_units() {
        let parsed = parse("4, km, mi").unwrap();
        assert_eq!(parsed.notices.len(), 2);
    }

    #[test]
    fn test_pair_empty_units() {
        assert_eq!(parse("4, , mile").unwrap_err(), QueryError::UnitEmpty { position: 2 });
        assert_eq!(parse("4, km, ").unwrap_err(), QueryError::UnitEmpty { position: 3 });
        // Empty first unit is reported before the value is checked
        assert_eq!(parse("x, , mile").unwrap_err(), QueryError::UnitEmpty { position: 2 });
    }

    #[test]
    fn test_pair_first_failure_stops() {
        // Value error is reported once, the second unit is never resolved
        assert_eq!(parse(", km, zzzzzz").unwrap_err(), QueryError::ValueEmpty);
    }

    #[test]
    fn test_pair_category_mismatch() {
        assert_eq!(
            parse("4, km, kg").unwrap_err(),
            QueryError::CategoryMismatch { first: "length".to_string(), second: "mass".to_string() }
        );
    }

    #[test]
    fn test_pair_same_unit() {
        let parsed = parse("5, meter, meter").unwrap();
        match parsed.query {
            ResolvedQuery::Pair { value, from, to } => {
                assert_eq!(value, 5.0);
                assert_eq!(from, to);
            }
            other => panic!("expected Pair, got {:?}", other),
        }
    }

    #[test]
    fn test_abbreviation_to_unknown_unit_is_invalid() {
        let category = Category::new("length").with_unit("meter", &[]);
        let catalog = UnitCatalog::new(
            vec![category],
            vec![("yd".to_string(), "yard".to_string())],
        ).unwrap();
        let parser = QueryParser::new(&catalog);
        assert_eq!(
            parser.parse("1, yd").unwrap_err(),
            QueryError::UnitInvalid { unit: "yd".to_string() }
        );
    }

    #[test]
    fn test_prettify_suggestions() {
        let category = Category::new("misc")
            .with_unit("week", &[Some("n")])
            .with_unit("foot", &[Some("n")]);
        let catalog = UnitCatalog::new(
            vec![category],
            vec![("ft".to_string(), "foot".to_string())],
        ).unwrap();
        let parser = QueryParser::new(&catalog);

        let pretty = parser.prettify_suggestions(vec!["week".into(), "foot".into(), "ft".into()]);
        assert_eq!(pretty, vec!["week", "foot (ft)"]);
    }
}
