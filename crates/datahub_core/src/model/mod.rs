//! Typed entity models.
//!
//! # Responsibility
//! - Define the four record shapes and their typed field setters.
//! - Compose the shared soft-delete state into every entity.
//!
//! # Invariants
//! - `id` is store-assigned and never settable through [`Entity::assign`].
//! - Deletion is represented by soft-delete state, never by row removal.

pub mod company;
pub mod generic_record;
pub mod project;
pub mod soft_delete;
pub mod staff_member;

use crate::schema::{EntityKind, FieldValue, RecordId};

pub use company::Company;
pub use generic_record::GenericRecord;
pub use project::Project;
pub use soft_delete::{SoftDeletable, SoftDeleteState};
pub use staff_member::StaffMember;

/// A persisted record shape registered in the schema registry.
///
/// `field`/`assign` form the per-entity whitelist: they accept exactly the
/// names declared in `KIND.schema().fields`.
pub trait Entity: SoftDeletable + Default {
    const KIND: EntityKind;

    /// Store-assigned id; `None` until the row is inserted.
    fn id(&self) -> Option<RecordId>;

    fn set_id(&mut self, id: RecordId);

    /// Reads one schema field. Returns `None` for names outside the schema.
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Writes one schema field.
    ///
    /// Returns `false` when the name is outside the schema or the value
    /// variant does not match the field's kind; the entity is left unchanged.
    fn assign(&mut self, name: &str, value: FieldValue) -> bool;
}
