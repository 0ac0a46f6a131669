pub mod catalog;
pub mod combination;
pub mod config;
pub mod filter;
pub mod ingest;
pub mod persistence;
pub mod time_grid;
pub mod validation;

pub use catalog::{Catalog, CatalogMetadata, Course, ScheduledSession, Section, SectionId, Session};
pub use combination::{
    ChosenSection, Combination, CombinationError, Schedule, SearchOptions, SectionChoice,
    combination_count, combinations_after_filter, enumerate_combinations, possible_schedules,
    possible_schedules_with, search_schedules, sessions_for_section,
};
pub use config::{IngestConfig, PlannerConfig, SearchConfig};
pub use filter::{SessionFilter, apply_filters, filter_by};
pub use ingest::IngestError;
pub use persistence::{
    PersistenceError, load_catalog_from_csv, load_catalog_from_json, read_catalog_csv,
    save_catalog_to_json, save_schedules_to_csv, save_schedules_to_json,
};
pub use time_grid::{Conflict, WeekGrid, merge_sessions, try_merge};
pub use validation::{DataIntegrityError, SectionConflict, ValidationReport, validate_catalog};
