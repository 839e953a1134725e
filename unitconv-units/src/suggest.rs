//! Spelling suggestions for unit and category names
//!
//! Matching is case-insensitive. Words containing the query win outright;
//! only when none do is edit distance consulted, and then every word at the
//! minimum distance is returned.

/// Levenshtein distance between two strings, ignoring case
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    // Rows over `a`, columns over `b`; only the previous row is kept
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, a_char) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, b_char) in b.iter().enumerate() {
            curr[j + 1] = if a_char == b_char {
                prev[j]
            } else {
                1 + prev[j].min(prev[j + 1]).min(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Candidates from `pool` for a mistyped `query`, in pool order
pub fn suggest<I, S>(pool: I, query: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let query_lower = query.to_lowercase();
    let words: Vec<S> = pool.into_iter().collect();

    let direct: Vec<String> = words
        .iter()
        .map(|w| w.as_ref())
        .filter(|w| w.to_lowercase().contains(&query_lower))
        .map(str::to_string)
        .collect();

    if !direct.is_empty() {
        return direct;
    }

    let scored: Vec<(&str, usize)> = words
        .iter()
        .map(|w| (w.as_ref(), edit_distance(&query_lower, w.as_ref())))
        .collect();

    let best = match scored.iter().map(|(_, d)| *d).min() {
        Some(best) => best,
        None => return Vec::new(),
    };

    scored
        .into_iter()
        .filter(|(_, d)| *d == best)
        .map(|(w, _)| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_basics() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_distance_identity_and_case() {
        assert_eq!(edit_distance("meter", "meter"), 0);
        assert_eq!(edit_distance("KM", "km"), 0);
    }

    #[test]
    fn test_distance_symmetric() {
        let words = ["kilometre", "kilometer", "kilogram", "ft", "", "Fahrenheit"];
        for a in words {
            for b in words {
                assert_eq!(edit_distance(a, b), edit_distance(b, a), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_transposition_costs_two() {
        assert_eq!(edit_distance("kilometre", "kilometer"), 2);
    }

    #[test]
    fn test_substring_hits_win() {
        // "kile" is one edit away, but substring hits skip distances entirely
        let pool = ["kilometer", "kilogram", "kile", "gram"];
        assert_eq!(suggest(pool, "kilo"), vec!["kilometer", "kilogram"]);
    }

    #[test]
    fn test_substring_case_insensitive() {
        let pool = ["KiB", "Kib", "kibibyte", "meter"];
        assert_eq!(suggest(pool, "KIB"), vec!["KiB", "Kib", "kibibyte"]);
    }

    #[test]
    fn test_min_distance_single() {
        let pool = ["meter", "kilometer", "kilogram", "mile"];
        assert_eq!(suggest(pool, "kilometre"), vec!["kilometer"]);
    }

    #[test]
    fn test_min_distance_ties_all_returned() {
        let pool = ["cat", "bat", "rat", "horse"];
        assert_eq!(suggest(pool, "hat"), vec!["cat", "bat", "rat"]);
    }

    #[test]
    fn test_empty_pool() {
        let pool: [&str; 0] = [];
        assert!(suggest(pool, "anything").is_empty());
    }

    #[test]
    fn test_owned_pool() {
        let pool = vec!["length".to_string(), "mass".to_string()];
        assert_eq!(suggest(&pool, "mas"), vec!["mass"]);
    }
}
