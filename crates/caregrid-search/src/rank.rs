//! Ranking: a strict, reproducible total order over reconciled candidates.
//!
//! The composite key is, most significant first: source (authoritative wins),
//! effective plan tier, featured addon, then the sort-mode-specific key, with
//! a stable id tiebreak at the end. `Vec::sort_by` is stable and f64 keys go
//! through `total_cmp`, so identical inputs always produce identical output —
//! pagination correctness depends on this.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use caregrid_core::{geo, Coordinates, PlanTier, SortBy};

use crate::types::{Candidate, RankedCandidate};

struct SortKey {
    source: u8,
    tier: u8,
    featured: u8,
    name_ci: String,
    created_at: Option<DateTime<Utc>>,
    distance: f64,
    id: String,
}

fn tier_rank(candidate: &Candidate) -> u8 {
    match candidate {
        Candidate::Authoritative(c) => match c.plan_tier {
            PlanTier::Enterprise => 0,
            PlanTier::Pro => 1,
            PlanTier::Free => 2,
        },
        // Ingested records carry no tier and rank below free listings.
        Candidate::Ingested(_) => 3,
    }
}

fn build_key(ranked: &RankedCandidate) -> SortKey {
    let candidate = &ranked.candidate;
    SortKey {
        source: match candidate {
            Candidate::Authoritative(_) => 0,
            Candidate::Ingested(_) => 1,
        },
        tier: tier_rank(candidate),
        featured: match candidate {
            Candidate::Authoritative(c) if c.has_featured_addon => 0,
            _ => 1,
        },
        name_ci: candidate.display_name().to_lowercase(),
        created_at: match candidate {
            Candidate::Authoritative(c) => Some(c.created_at),
            Candidate::Ingested(_) => None,
        },
        distance: ranked.distance_miles.unwrap_or(f64::INFINITY),
        id: candidate.id(),
    }
}

fn compare(a: &SortKey, b: &SortKey, sort_by: SortBy) -> Ordering {
    let prominence = a
        .source
        .cmp(&b.source)
        .then(a.tier.cmp(&b.tier))
        .then(a.featured.cmp(&b.featured));

    let mode = match sort_by {
        SortBy::Distance => a
            .distance
            .total_cmp(&b.distance)
            .then_with(|| a.name_ci.cmp(&b.name_ci)),
        SortBy::Name => a.name_ci.cmp(&b.name_ci),
        SortBy::Newest => compare_newest(a, b).then_with(|| a.name_ci.cmp(&b.name_ci)),
        // Relevance is trust and prominence first, proximity second.
        SortBy::Relevance => a
            .distance
            .total_cmp(&b.distance)
            .then_with(|| a.name_ci.cmp(&b.name_ci)),
    };

    prominence.then(mode).then_with(|| a.id.cmp(&b.id))
}

/// Newest first; candidates without a creation timestamp (ingested) sort after
/// all timestamped ones.
fn compare_newest(a: &SortKey, b: &SortKey) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(ta), Some(tb)) => tb.cmp(&ta),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Annotate candidates with distance from `origin` and sort them into the
/// composite order for `sort_by`.
#[must_use]
pub fn rank(
    candidates: Vec<Candidate>,
    sort_by: SortBy,
    origin: Option<Coordinates>,
) -> Vec<RankedCandidate> {
    let mut keyed: Vec<(SortKey, RankedCandidate)> = candidates
        .into_iter()
        .map(|candidate| {
            let distance_miles = match (origin, candidate.coordinates()) {
                (Some(from), Some(to)) => Some(geo::distance_miles(from, to)),
                _ => None,
            };
            let ranked = RankedCandidate {
                candidate,
                distance_miles,
            };
            (build_key(&ranked), ranked)
        })
        .collect();

    keyed.sort_by(|(ka, _), (kb, _)| compare(ka, kb, sort_by));
    keyed.into_iter().map(|(_, ranked)| ranked).collect()
}
