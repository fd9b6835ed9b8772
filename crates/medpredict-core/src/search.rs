//! Substring search over the symptom vocabulary, for autocomplete and
//! suggestions.
//!
//! Matching is case-insensitive containment only. Results follow vocabulary
//! order, so the same query always returns the same list.

use crate::vocabulary::SymptomVocabulary;

/// Symptoms containing `query` (case-insensitive), at most `limit` of them.
///
/// An empty query matches every symptom; callers that need a minimum query
/// length enforce it themselves.
pub fn search_symptoms<'a>(
    vocabulary: &'a SymptomVocabulary,
    query: &str,
    limit: usize,
) -> Vec<&'a str> {
    let needle = query.to_lowercase();
    vocabulary
        .iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}
