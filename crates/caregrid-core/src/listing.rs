//! Domain vocabulary shared across the search engine and persistence layer.
//!
//! Enum values serialize to the lowercase snake_case strings stored in the
//! database TEXT columns, so `as_str`/`FromStr` round-trip against row data.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid plan tier: {0}")]
    InvalidPlanTier(String),
    #[error("invalid listing status: {0}")]
    InvalidListingStatus(String),
    #[error("invalid ingested listing status: {0}")]
    InvalidIngestedStatus(String),
    #[error("invalid service mode: {0}")]
    InvalidServiceMode(String),
    #[error("invalid removal request state: {0}")]
    InvalidRemovalState(String),
}

/// Subscription tier of a provider-managed listing. Ordered: higher tiers
/// rank above lower ones in search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Pro,
    Enterprise,
}

impl PlanTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

impl FromStr for PlanTier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanTier::Free),
            "pro" => Ok(PlanTier::Pro),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(DomainError::InvalidPlanTier(other.to_string())),
        }
    }
}

/// A paid tier only counts while the subscription behind it is live.
/// Lapsed subscriptions rank as `Free` regardless of the stored tier.
#[must_use]
pub fn effective_plan_tier(tier: PlanTier, subscription_status: Option<&str>) -> PlanTier {
    if tier == PlanTier::Free {
        return PlanTier::Free;
    }
    match subscription_status {
        Some("active" | "trialing") => tier,
        _ => PlanTier::Free,
    }
}

/// Lifecycle status of a provider-managed listing. Only `Published` rows are
/// searchable; listings are never hard-deleted, they move to `Suspended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Published,
    Suspended,
}

impl ListingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Published => "published",
            ListingStatus::Suspended => "suspended",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ListingStatus::Draft),
            "published" => Ok(ListingStatus::Published),
            "suspended" => Ok(ListingStatus::Suspended),
            other => Err(DomainError::InvalidListingStatus(other.to_string())),
        }
    }
}

/// Status of an auto-ingested place record. `Removed` is reached only through
/// an approved removal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestedStatus {
    Active,
    Removed,
}

impl IngestedStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IngestedStatus::Active => "active",
            IngestedStatus::Removed => "removed",
        }
    }
}

impl FromStr for IngestedStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(IngestedStatus::Active),
            "removed" => Ok(IngestedStatus::Removed),
            other => Err(DomainError::InvalidIngestedStatus(other.to_string())),
        }
    }
}

/// How a location delivers services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    InHome,
    InCenter,
    Telehealth,
    Hybrid,
}

impl ServiceMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceMode::InHome => "in_home",
            ServiceMode::InCenter => "in_center",
            ServiceMode::Telehealth => "telehealth",
            ServiceMode::Hybrid => "hybrid",
        }
    }
}

impl FromStr for ServiceMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_home" => Ok(ServiceMode::InHome),
            "in_center" => Ok(ServiceMode::InCenter),
            "telehealth" => Ok(ServiceMode::Telehealth),
            "hybrid" => Ok(ServiceMode::Hybrid),
            other => Err(DomainError::InvalidServiceMode(other.to_string())),
        }
    }
}

/// State of a removal request. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalState {
    Pending,
    Approved,
    Rejected,
}

impl RemovalState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RemovalState::Pending => "pending",
            RemovalState::Approved => "approved",
            RemovalState::Rejected => "rejected",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, RemovalState::Pending)
    }
}

impl FromStr for RemovalState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RemovalState::Pending),
            "approved" => Ok(RemovalState::Approved),
            "rejected" => Ok(RemovalState::Rejected),
            other => Err(DomainError::InvalidRemovalState(other.to_string())),
        }
    }
}
