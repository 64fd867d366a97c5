//! Generic entity repository and SQLite implementation.
//!
//! # Responsibility
//! - Persist any registered [`Entity`] using its schema's column list.
//! - Map SQLite failures onto semantic repository errors.
//!
//! # Invariants
//! - Writes always persist the soft-delete pair together.
//! - Read paths reject inconsistent persisted state instead of masking it.
//! - `find_by_id` is the only read that ignores the soft-delete flag.

use super::visibility::{self, VisibleScope};
use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::soft_delete::{DELETED_AT_COLUMN, IS_DELETED_COLUMN};
use crate::model::{Entity, SoftDeletable, SoftDeleteState};
use crate::schema::coerce::ISO_DATE_FORMAT;
use crate::schema::{EntityKind, EntitySchema, FieldKind, FieldValue, RecordId};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DELETED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// UNIQUE, FOREIGN KEY or CHECK constraint rejected the write.
    Constraint(String),
    NotFound {
        kind: EntityKind,
        id: RecordId,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Constraint(message) => write!(f, "constraint violation: {message}"),
            Self::NotFound { kind, id } => write!(f, "{kind} record not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "record repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            return Self::Constraint(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Open write transaction. Dropping it without [`WriteScope::commit`] rolls
/// every statement issued since [`EntityRepository::begin_write`] back.
pub struct WriteScope<'conn> {
    tx: Transaction<'conn>,
}

impl WriteScope<'_> {
    pub fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

/// Repository interface shared by every entity kind.
pub trait EntityRepository {
    /// Starts an immediate write transaction on the underlying session.
    fn begin_write(&self) -> RepoResult<WriteScope<'_>>;
    /// Inserts a new row and returns its store-assigned id.
    fn insert<E: Entity>(&self, entity: &E) -> RepoResult<RecordId>;
    /// Writes every column of an existing row, soft-delete pair included.
    fn save<E: Entity>(&self, entity: &E) -> RepoResult<()>;
    /// Direct lookup by id, regardless of soft-delete state.
    fn find_by_id<E: Entity>(&self, id: RecordId) -> RepoResult<Option<E>>;
    /// All visible rows ordered by id.
    fn list_visible<E: Entity>(&self) -> RepoResult<Vec<E>>;
    /// One visible row by id.
    fn find_visible<E: Entity>(&self, id: RecordId) -> RepoResult<Option<E>>;
    /// Display name of a visible row of any kind.
    fn visible_display_name(&self, kind: EntityKind, id: RecordId) -> RepoResult<Option<String>>;
}

/// SQLite-backed repository bound to one connection (the store session).
pub struct SqliteEntityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityRepository<'conn> {
    /// Constructs a repository from a connection already checked by
    /// [`SqliteEntityRepository::try_new`] or opened through `db::open_db*`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Constructs a repository after verifying the connection is migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntityRepository for SqliteEntityRepository<'_> {
    fn begin_write(&self) -> RepoResult<WriteScope<'_>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        Ok(WriteScope { tx })
    }

    fn insert<E: Entity>(&self, entity: &E) -> RepoResult<RecordId> {
        let schema = E::KIND.schema();
        let columns = column_values(schema, entity)?;
        let names = columns
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|slot| format!("?{slot}"))
            .collect::<Vec<_>>()
            .join(", ");

        self.conn.execute(
            &format!(
                "INSERT INTO {} ({names}) VALUES ({placeholders});",
                schema.table
            ),
            params_from_iter(columns.into_iter().map(|(_, value)| value)),
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn save<E: Entity>(&self, entity: &E) -> RepoResult<()> {
        let schema = E::KIND.schema();
        let id = entity.id().ok_or_else(|| {
            RepoError::InvalidData(format!("cannot save unsaved {} record", schema.token))
        })?;

        let columns = column_values(schema, entity)?;
        let assignments = columns
            .iter()
            .enumerate()
            .map(|(index, (name, _))| format!("{name} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let id_slot = columns.len() + 1;

        let mut values = columns
            .into_iter()
            .map(|(_, value)| value)
            .collect::<Vec<_>>();
        values.push(Value::Integer(id));

        let changed = self.conn.execute(
            &format!(
                "UPDATE {} SET {assignments} WHERE id = ?{id_slot};",
                schema.table
            ),
            params_from_iter(values),
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: E::KIND,
                id,
            });
        }

        Ok(())
    }

    fn find_by_id<E: Entity>(&self, id: RecordId) -> RepoResult<Option<E>> {
        let sql = format!("{} WHERE id = ?1;", select_sql(E::KIND.schema()));
        let mut rows = read_rows::<E>(self.conn, &sql, &[Value::Integer(id)])?;
        Ok(rows.pop())
    }

    fn list_visible<E: Entity>(&self) -> RepoResult<Vec<E>> {
        visibility::query_visible(self.conn, VisibleScope::All)
    }

    fn find_visible<E: Entity>(&self, id: RecordId) -> RepoResult<Option<E>> {
        let mut rows = visibility::query_visible(self.conn, VisibleScope::Id(id))?;
        Ok(rows.pop())
    }

    fn visible_display_name(&self, kind: EntityKind, id: RecordId) -> RepoResult<Option<String>> {
        visibility::visible_display_name(self.conn, kind, id)
    }
}

/// Base `SELECT` for one entity; callers append their own `WHERE`.
pub(super) fn select_sql(schema: &EntitySchema) -> String {
    let fields = schema
        .fields
        .iter()
        .map(|spec| spec.name)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT id, {fields}, {IS_DELETED_COLUMN}, {DELETED_AT_COLUMN} FROM {}",
        schema.table
    )
}

pub(super) fn read_rows<E: Entity>(
    conn: &Connection,
    sql: &str,
    binds: &[Value],
) -> RepoResult<Vec<E>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(binds.iter()))?;
    let mut entities = Vec::new();

    while let Some(row) = rows.next()? {
        entities.push(parse_entity_row::<E>(row)?);
    }

    Ok(entities)
}

fn parse_entity_row<E: Entity>(row: &Row<'_>) -> RepoResult<E> {
    let schema = E::KIND.schema();
    let id: RecordId = row.get("id")?;
    let mut entity = E::default();
    entity.set_id(id);

    for spec in schema.fields {
        let value = match spec.kind {
            FieldKind::Text | FieldKind::RequiredText => FieldValue::Text(row.get(spec.name)?),
            FieldKind::Integer | FieldKind::ForeignKey { .. } => {
                FieldValue::Integer(row.get(spec.name)?)
            }
            FieldKind::Date => FieldValue::Date(row.get::<_, Option<NaiveDate>>(spec.name)?),
        };
        if !entity.assign(spec.name, value) {
            return Err(RepoError::InvalidData(format!(
                "invalid value in {}.{} for id {id}",
                schema.table, spec.name
            )));
        }
    }

    let is_deleted = match row.get::<_, i64>(IS_DELETED_COLUMN)? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in {}.is_deleted",
                schema.table
            )));
        }
    };
    let deleted_at: Option<NaiveDateTime> = row.get(DELETED_AT_COLUMN)?;
    *entity.soft_delete_state_mut() = SoftDeleteState::from_columns(is_deleted, deleted_at)
        .map_err(|err| RepoError::InvalidData(format!("{}.{id}: {err}", schema.table)))?;

    Ok(entity)
}

fn column_values<E: Entity>(
    schema: &EntitySchema,
    entity: &E,
) -> RepoResult<Vec<(&'static str, Value)>> {
    let mut columns = Vec::with_capacity(schema.fields.len() + 2);

    for spec in schema.fields {
        let value = entity.field(spec.name).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "{} does not expose field `{}`",
                schema.token, spec.name
            ))
        })?;
        columns.push((spec.name, to_sql_value(value)));
    }

    let state = entity.soft_delete_state();
    columns.push((IS_DELETED_COLUMN, Value::Integer(bool_to_int(state.is_deleted()))));
    columns.push((
        DELETED_AT_COLUMN,
        state.deleted_at().map_or(Value::Null, |at| {
            Value::Text(at.format(DELETED_AT_FORMAT).to_string())
        }),
    ));

    Ok(columns)
}

fn to_sql_value(value: FieldValue) -> Value {
    match value {
        FieldValue::Text(text) => text.map_or(Value::Null, Value::Text),
        FieldValue::Integer(number) => number.map_or(Value::Null, Value::Integer),
        FieldValue::Date(date) => date.map_or(Value::Null, |date| {
            Value::Text(date.format(ISO_DATE_FORMAT).to_string())
        }),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for kind in EntityKind::ALL {
        let table = kind.schema().table;
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
