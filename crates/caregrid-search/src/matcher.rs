//! Cross-source identity matching.
//!
//! Decides whether a provider-managed listing location and an auto-ingested
//! place record represent the same real-world business, using a deterministic
//! normalized-name + proximity rule. Deliberately conservative: a false
//! positive would hide a legitimate competing business, a false negative only
//! shows a duplicate card.

use caregrid_core::{geo, states};

use crate::types::{AuthoritativeCandidate, IngestedCandidate};

/// Legal-entity suffixes stripped from the tail of business names before
/// comparison.
const LEGAL_SUFFIXES: &[&str] = &[
    "llc",
    "inc",
    "ltd",
    "corp",
    "co",
    "pllc",
    "pc",
    "pa",
    "incorporated",
    "corporation",
    "company",
];

/// Tunable thresholds for identity matching. The defaults are policy, not a
/// hard requirement.
#[derive(Debug, Clone, Copy)]
pub struct MatchPolicy {
    /// Maximum distance between two coordinate-bearing records for a
    /// name-equal pair to count as the same business.
    pub max_distance_miles: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            max_distance_miles: 0.5,
        }
    }
}

/// Lowercase, strip punctuation, and drop trailing legal suffixes.
///
/// "Sunrise ABA, LLC" and "sunrise aba" normalize to the same key.
#[must_use]
pub fn normalize_business_name(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = folded.split_whitespace().collect();
    while let Some(last) = tokens.last() {
        if LEGAL_SUFFIXES.contains(last) {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens.join(" ")
}

/// Whether an authoritative listing location and an ingested record are the
/// same business.
///
/// Matches when normalized names are equal AND either both records carry
/// coordinates within `policy.max_distance_miles` of each other, or one side
/// lacks coordinates but both share the same city and state. Never matches
/// across states, and a record with an empty name never matches anything.
#[must_use]
pub fn same_business(
    auth: &AuthoritativeCandidate,
    ingested: &IngestedCandidate,
    policy: &MatchPolicy,
) -> bool {
    let auth_name = normalize_business_name(&auth.agency_name);
    let ingested_name = normalize_business_name(&ingested.name);
    if auth_name.is_empty() || ingested_name.is_empty() {
        // Data-quality signal, not an error: upstream ingestion produced a
        // nameless record.
        tracing::debug!(
            listing_id = %auth.listing_id,
            place_id = %ingested.place_id,
            "identity match skipped: empty business name"
        );
        return false;
    }
    if auth_name != ingested_name {
        return false;
    }
    if !states::same_state(&auth.state, &ingested.state) {
        return false;
    }

    match (auth.coordinates, ingested.coordinates) {
        (Some(a), Some(b)) => geo::distance_miles(a, b) <= policy.max_distance_miles,
        _ => auth.city.trim().eq_ignore_ascii_case(ingested.city.trim()),
    }
}
