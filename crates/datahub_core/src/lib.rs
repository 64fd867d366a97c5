//! Core domain logic for datahub.
//! This crate owns the entity schemas, the soft-delete visibility rule and
//! the generic CRUD dispatcher.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::{
    Company, Entity, GenericRecord, Project, SoftDeletable, SoftDeleteState, StaffMember,
};
pub use repo::{EntityRepository, RepoError, RepoResult, SqliteEntityRepository};
pub use schema::{EntityKind, FieldKind, FieldValue, Record, RecordId, UnknownEntity};
pub use service::dispatcher::{DispatchError, DispatchResult, Dispatcher, FieldMap};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
