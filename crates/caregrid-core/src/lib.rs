pub mod app_config;
pub mod config;
pub mod filters;
pub mod geo;
pub mod listing;
pub mod states;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use filters::{
    AgeRange, SearchFilters, SearchOptions, SortBy, ValidationError, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE, MAX_RADIUS_MILES,
};
pub use geo::Coordinates;
pub use listing::{
    effective_plan_tier, DomainError, IngestedStatus, ListingStatus, PlanTier, RemovalState,
    ServiceMode,
};
pub use states::{same_state, state_forms, StateForms};
