//! Search query modeling: explicit filter/option structs validated at the
//! boundary, before any fetch runs.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::geo::Coordinates;
use crate::listing::ServiceMode;

/// Hard cap on proximity search radius.
pub const MAX_RADIUS_MILES: f64 = 200.0;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("radius_miles requires both user_lat and user_lng")]
    RadiusWithoutOrigin,
    #[error("radius_miles must be positive, got {0}")]
    NonPositiveRadius(f64),
    #[error("radius_miles {0} exceeds maximum {MAX_RADIUS_MILES}")]
    RadiusTooLarge(f64),
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),
    #[error("age range min {min} exceeds max {max}")]
    InvalidAgeRange { min: u8, max: u8 },
    #[error("page must be at least 1")]
    PageOutOfRange,
    #[error("page_size {0} is outside [1, {MAX_PAGE_SIZE}]")]
    PageSizeOutOfRange(u32),
}

/// Ages-served band. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: Option<u8>,
    pub max: Option<u8>,
}

/// Directory search predicates. All fields optional; an empty filter set
/// matches every published/active record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub insurances: Vec<String>,
    pub service_modes: Vec<ServiceMode>,
    pub languages: Vec<String>,
    pub diagnoses: Vec<String>,
    pub ages_served: Option<AgeRange>,
    pub availability_only: bool,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    pub radius_miles: Option<f64>,
}

impl SearchFilters {
    /// Query origin point, present only when both coordinates are set.
    #[must_use]
    pub fn origin(&self) -> Option<Coordinates> {
        match (self.user_lat, self.user_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }

    /// Reject malformed or contradictory filter combinations.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(lat) = self.user_lat {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ValidationError::InvalidLatitude(lat));
            }
        }
        if let Some(lng) = self.user_lng {
            if !(-180.0..=180.0).contains(&lng) {
                return Err(ValidationError::InvalidLongitude(lng));
            }
        }
        if let Some(radius) = self.radius_miles {
            if self.origin().is_none() {
                return Err(ValidationError::RadiusWithoutOrigin);
            }
            // NaN fails the comparison and must be rejected too.
            if radius.is_nan() || radius <= 0.0 {
                return Err(ValidationError::NonPositiveRadius(radius));
            }
            if radius > MAX_RADIUS_MILES {
                return Err(ValidationError::RadiusTooLarge(radius));
            }
        }
        if let Some(AgeRange {
            min: Some(min),
            max: Some(max),
        }) = self.ages_served
        {
            if min > max {
                return Err(ValidationError::InvalidAgeRange { min, max });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Name,
    Newest,
    Distance,
}

impl FromStr for SortBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortBy::Relevance),
            "name" => Ok(SortBy::Name),
            "newest" => Ok(SortBy::Newest),
            "distance" => Ok(SortBy::Distance),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub sort_by: SortBy,
    pub page: u32,
    pub page_size: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            sort_by: SortBy::Relevance,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchOptions {
    /// # Errors
    ///
    /// Returns [`ValidationError::PageOutOfRange`] for page 0 and
    /// [`ValidationError::PageSizeOutOfRange`] for a page size outside
    /// `1..=MAX_PAGE_SIZE`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page < 1 {
            return Err(ValidationError::PageOutOfRange);
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::PageSizeOutOfRange(self.page_size));
        }
        Ok(())
    }
}
