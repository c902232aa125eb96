//! Person record data access core.
//! This crate owns the person store schema and its business invariants.

pub mod db;
pub mod fixtures;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use fixtures::{load_dataset, Dataset, DatasetSummary, FixtureError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::attribute_type::{
    AttributeTypeDraft, AttributeTypeId, AttributeTypeValidationError, PersonAttributeType,
};
pub use model::person::{Gender, Person, PersonId, PersonValidationError};
pub use model::person_name::{PersonName, PersonNameId, PersonNameValidationError};
pub use repo::person_repo::{PersonRepository, RepoError, RepoResult, SqlitePersonRepository};
pub use service::person_service::{PersonService, RenamedAttributeType};

/// Minimal health-check API for linkage probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
