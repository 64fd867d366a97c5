//! Shared soft-delete state.
//!
//! # Invariants
//! - `is_deleted()` is true exactly when `deleted_at()` is set.
//! - State only moves forward: there is no way back to active.

use chrono::NaiveDateTime;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Column holding the deleted flag in every record table.
pub const IS_DELETED_COLUMN: &str = "is_deleted";
/// Column holding the deletion timestamp in every record table.
pub const DELETED_AT_COLUMN: &str = "deleted_at";

/// Soft-delete pair embedded in every entity.
///
/// Both columns are derived from one optional timestamp, so they cannot
/// disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftDeleteState {
    deleted_at: Option<NaiveDateTime>,
}

impl SoftDeleteState {
    pub fn active() -> Self {
        Self::default()
    }

    /// Rebuilds state from persisted columns, rejecting a mismatched pair.
    pub fn from_columns(
        is_deleted: bool,
        deleted_at: Option<NaiveDateTime>,
    ) -> Result<Self, InconsistentSoftDelete> {
        match (is_deleted, deleted_at) {
            (false, None) => Ok(Self::active()),
            (true, Some(at)) => Ok(Self {
                deleted_at: Some(at),
            }),
            _ => Err(InconsistentSoftDelete {
                is_deleted,
                has_deleted_at: deleted_at.is_some(),
            }),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn deleted_at(&self) -> Option<NaiveDateTime> {
        self.deleted_at
    }

    /// Flags the row deleted at `at`. Re-marking refreshes the timestamp.
    pub fn mark_deleted(&mut self, at: NaiveDateTime) {
        self.deleted_at = Some(at);
    }
}

/// Persisted `is_deleted`/`deleted_at` pair that does not agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InconsistentSoftDelete {
    pub is_deleted: bool,
    pub has_deleted_at: bool,
}

impl Display for InconsistentSoftDelete {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "inconsistent soft-delete pair: is_deleted={} deleted_at_set={}",
            self.is_deleted, self.has_deleted_at
        )
    }
}

impl Error for InconsistentSoftDelete {}

/// Anything carrying the soft-delete pair.
pub trait SoftDeletable {
    fn soft_delete_state(&self) -> &SoftDeleteState;

    fn soft_delete_state_mut(&mut self) -> &mut SoftDeleteState;

    fn is_deleted(&self) -> bool {
        self.soft_delete_state().is_deleted()
    }

    fn deleted_at(&self) -> Option<NaiveDateTime> {
        self.soft_delete_state().deleted_at()
    }

    /// Returns whether this row should appear in listing reads.
    fn is_visible(&self) -> bool {
        !self.is_deleted()
    }

    fn mark_deleted(&mut self, at: NaiveDateTime) {
        self.soft_delete_state_mut().mark_deleted(at);
    }
}
