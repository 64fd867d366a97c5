//! Visibility filter: the single read-side funnel for soft-deleted rows.
//!
//! # Responsibility
//! - Build every listing/find query so it only sees `is_deleted = 0` rows.
//! - Serve link lookups (display names) under the same rule.
//!
//! # Invariants
//! - Every query built here carries the visibility predicate; there is no
//!   opt-out parameter.
//! - Write paths and the direct id lookup in `entity_repo` never come through
//!   here, so deleted rows stay addressable for update/delete.

use super::entity_repo::{read_rows, select_sql, RepoResult};
use crate::model::soft_delete::IS_DELETED_COLUMN;
use crate::model::Entity;
use crate::schema::{EntityKind, RecordId};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};

/// Which visible rows a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleScope {
    All,
    Id(RecordId),
}

/// The predicate appended to every visible read.
pub fn visible_predicate() -> String {
    format!("{IS_DELETED_COLUMN} = 0")
}

/// Reads visible rows of `E`, ordered by id.
pub fn query_visible<E: Entity>(conn: &Connection, scope: VisibleScope) -> RepoResult<Vec<E>> {
    let mut sql = format!(
        "{} WHERE {}",
        select_sql(E::KIND.schema()),
        visible_predicate()
    );
    let mut binds = Vec::new();

    if let VisibleScope::Id(id) = scope {
        sql.push_str(" AND id = ?1");
        binds.push(Value::Integer(id));
    }
    sql.push_str(" ORDER BY id ASC;");

    read_rows(conn, &sql, &binds)
}

/// Returns the display field of a visible row, or `None` when the row is
/// missing or soft-deleted.
pub fn visible_display_name(
    conn: &Connection,
    kind: EntityKind,
    id: RecordId,
) -> RepoResult<Option<String>> {
    let schema = kind.schema();
    let name = conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1 AND {};",
                schema.display_field,
                schema.table,
                visible_predicate()
            ),
            [id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}
