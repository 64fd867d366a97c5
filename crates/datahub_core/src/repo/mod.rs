//! Repository layer for the four record tables.
//!
//! # Responsibility
//! - Keep SQL details inside the persistence boundary.
//! - Route every listing read through the visibility filter.
//!
//! # Invariants
//! - Call sites never issue raw SELECTs; visible reads live in [`visibility`]
//!   and the only unfiltered read is the direct id lookup used by writes.
//! - Repository APIs return semantic errors (`NotFound`, `Constraint`) in
//!   addition to DB transport errors.

pub mod entity_repo;
pub mod links;
pub mod visibility;

pub use entity_repo::{
    EntityRepository, RepoError, RepoResult, SqliteEntityRepository, WriteScope,
};
pub use links::CachedLinks;
