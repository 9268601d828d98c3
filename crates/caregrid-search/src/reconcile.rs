//! Cross-source reconciliation: suppress ingested duplicates of
//! authoritative listings and honor approved removals.

use std::collections::HashSet;

use crate::matcher::{same_business, MatchPolicy};
use crate::types::{AuthoritativeCandidate, Candidate, IngestedCandidate};

/// Merge the two candidate sets into one deduplicated list.
///
/// Every ingested candidate is tested pairwise against every authoritative
/// candidate — O(A×I), fine at the few-hundred-per-query scale the upstream
/// filters guarantee. An ingested candidate is dropped when it matches any
/// authoritative location (the authoritative listing supersedes it) or when
/// its id sits in the approved-removal set; the fetcher already excludes
/// removed rows, this re-check keeps the invariant even if it did not.
#[must_use]
pub fn merge(
    authoritative: Vec<AuthoritativeCandidate>,
    ingested: Vec<IngestedCandidate>,
    approved_removals: &HashSet<String>,
    policy: &MatchPolicy,
) -> Vec<Candidate> {
    let mut merged = Vec::with_capacity(authoritative.len() + ingested.len());

    // One candidate per distinct location, even if the store handed us
    // duplicate rows.
    let mut seen_locations = HashSet::new();
    let authoritative: Vec<AuthoritativeCandidate> = authoritative
        .into_iter()
        .filter(|c| seen_locations.insert(c.location_id))
        .collect();

    for candidate in &ingested {
        if approved_removals.contains(&candidate.place_id) {
            tracing::debug!(place_id = %candidate.place_id, "dropping ingested candidate: approved removal");
            continue;
        }
        if let Some(matched) = authoritative
            .iter()
            .find(|auth| same_business(auth, candidate, policy))
        {
            tracing::debug!(
                place_id = %candidate.place_id,
                listing_id = %matched.listing_id,
                "suppressing ingested duplicate of authoritative listing"
            );
            continue;
        }
        merged.push(Candidate::Ingested(candidate.clone()));
    }

    let mut result: Vec<Candidate> = authoritative
        .into_iter()
        .map(Candidate::Authoritative)
        .collect();
    result.append(&mut merged);
    result
}
