//! Generic CRUD dispatcher.
//!
//! # Responsibility
//! - Resolve a caller-supplied model token to its entity type.
//! - Validate and coerce untyped field maps through the schema whitelist.
//! - Run create/read/update/soft-delete against the repository.
//!
//! # Invariants
//! - Every mutating operation runs in one write transaction; any error drops
//!   it, rolling back all changes.
//! - Update and SoftDelete locate rows by direct id lookup, so they still work
//!   on rows that are already soft-deleted.
//! - Read-all only ever sees rows passed by the visibility filter.

use crate::model::{Company, Entity, GenericRecord, Project, SoftDeletable, StaffMember};
use crate::repo::{CachedLinks, EntityRepository, RepoError};
use crate::schema::coerce::{coerce_field, CoercionMode, FieldError};
use crate::schema::{serialize, EntityKind, FieldValue, Record, RecordId, UnknownEntity};
use chrono::Utc;
use log::{info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Untyped request body: a flat JSON object.
pub type FieldMap = serde_json::Map<String, Value>;

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Failure taxonomy surfaced by the dispatcher.
#[derive(Debug)]
pub enum DispatchError {
    UnknownEntity(String),
    MissingField {
        entity: EntityKind,
        field: &'static str,
    },
    InvalidDate {
        field: &'static str,
        value: String,
    },
    InvalidValue {
        field: &'static str,
        expected: &'static str,
    },
    NotFound {
        entity: EntityKind,
        id: RecordId,
    },
    ConstraintViolation(String),
    Store(RepoError),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEntity(name) => write!(f, "{}", UnknownEntity(name.clone())),
            Self::MissingField { entity, field } => {
                write!(f, "missing required field `{field}` for {entity}")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "invalid date `{value}` for `{field}`; expected YYYY-MM-DD")
            }
            Self::InvalidValue { field, expected } => {
                write!(f, "invalid value for `{field}`; expected {expected}")
            }
            Self::NotFound { entity, id } => write!(f, "{entity} record not found: {id}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl DispatchError {
    /// Stable snake_case code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownEntity(_) => "unknown_entity",
            Self::MissingField { .. } => "missing_field",
            Self::InvalidDate { .. } => "invalid_date",
            Self::InvalidValue { .. } => "invalid_value",
            Self::NotFound { .. } => "not_found",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::Store(_) => "store_error",
        }
    }

    fn from_field(entity: EntityKind, err: FieldError) -> Self {
        match err {
            FieldError::Missing { field } => Self::MissingField { entity, field },
            FieldError::InvalidDate { field, value } => Self::InvalidDate { field, value },
            FieldError::InvalidValue { field, expected } => Self::InvalidValue { field, expected },
        }
    }
}

impl From<UnknownEntity> for DispatchError {
    fn from(value: UnknownEntity) -> Self {
        Self::UnknownEntity(value.0)
    }
}

impl From<RepoError> for DispatchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Constraint(message) => Self::ConstraintViolation(message),
            RepoError::NotFound { kind, id } => Self::NotFound { entity: kind, id },
            other => Self::Store(other),
        }
    }
}

/// Routes an entity kind to code generic over its concrete type.
macro_rules! with_entity {
    ($kind:expr, $entity:ident => $body:expr) => {
        match $kind {
            EntityKind::Datos => {
                type $entity = GenericRecord;
                $body
            }
            EntityKind::Usuarios => {
                type $entity = StaffMember;
                $body
            }
            EntityKind::Empresas => {
                type $entity = Company;
                $body
            }
            EntityKind::Proyectos => {
                type $entity = Project;
                $body
            }
        }
    };
}

/// Single polymorphic entry point for record CRUD.
pub struct Dispatcher<R: EntityRepository> {
    repo: R,
}

impl<R: EntityRepository> Dispatcher<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one row and returns its serialized form.
    ///
    /// Keys outside the schema (including `id` and the soft-delete pair) are
    /// ignored.
    pub fn create(&self, model: &str, fields: &FieldMap) -> DispatchResult<Record> {
        let started_at = Instant::now();
        let result = EntityKind::resolve(model)
            .map_err(DispatchError::from)
            .and_then(|kind| with_entity!(kind, E => self.create_as::<E>(fields)));
        log_outcome("record_create", model, None, &result, started_at);
        result
    }

    /// Lists every visible row of the model.
    pub fn read_all(&self, model: &str) -> DispatchResult<Vec<Record>> {
        let kind = EntityKind::resolve(model)?;
        with_entity!(kind, E => self.read_all_as::<E>())
    }

    /// Applies a partial update to the row with `id`.
    ///
    /// Only whitelisted schema keys are applied; others are ignored.
    pub fn update(&self, model: &str, id: RecordId, fields: &FieldMap) -> DispatchResult<()> {
        let started_at = Instant::now();
        let result = EntityKind::resolve(model)
            .map_err(DispatchError::from)
            .and_then(|kind| with_entity!(kind, E => self.update_as::<E>(id, fields)));
        log_outcome("record_update", model, Some(id), &result, started_at);
        result
    }

    /// Soft-deletes the row with `id`. Repeating the call succeeds again and
    /// refreshes `deleted_at`.
    pub fn soft_delete(&self, model: &str, id: RecordId) -> DispatchResult<()> {
        let started_at = Instant::now();
        let result = EntityKind::resolve(model)
            .map_err(DispatchError::from)
            .and_then(|kind| with_entity!(kind, E => self.soft_delete_as::<E>(id)));
        log_outcome("record_delete", model, Some(id), &result, started_at);
        result
    }

    /// Fails with `NotFound` unless a row with `id` exists, deleted or not.
    pub fn require_row(&self, model: &str, id: RecordId) -> DispatchResult<()> {
        let kind = EntityKind::resolve(model)?;
        with_entity!(kind, E => self.load::<E>(id).map(|_| ()))
    }

    fn create_as<E: Entity>(&self, fields: &FieldMap) -> DispatchResult<Record> {
        let schema = E::KIND.schema();
        let mut entity = E::default();

        for spec in schema.fields {
            let value = coerce_field(spec, fields.get(spec.name), CoercionMode::Create)
                .map_err(|err| DispatchError::from_field(E::KIND, err))?;
            assign_checked(&mut entity, spec.name, value)?;
        }

        let scope = self.repo.begin_write()?;
        let id = self.repo.insert(&entity)?;
        entity.set_id(id);
        let record = serialize(&entity, &mut CachedLinks::new(&self.repo))?;
        scope.commit()?;
        Ok(record)
    }

    fn read_all_as<E: Entity>(&self) -> DispatchResult<Vec<Record>> {
        let rows = self.repo.list_visible::<E>()?;
        let mut links = CachedLinks::new(&self.repo);
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(serialize(row, &mut links)?);
        }
        Ok(records)
    }

    fn update_as<E: Entity>(&self, id: RecordId, fields: &FieldMap) -> DispatchResult<()> {
        let schema = E::KIND.schema();
        let scope = self.repo.begin_write()?;
        let mut entity = self.load::<E>(id)?;

        for (key, raw) in fields {
            let Some(spec) = schema.field(key) else {
                continue;
            };
            let value = coerce_field(spec, Some(raw), CoercionMode::Update)
                .map_err(|err| DispatchError::from_field(E::KIND, err))?;
            assign_checked(&mut entity, spec.name, value)?;
        }

        self.repo.save(&entity)?;
        scope.commit()?;
        Ok(())
    }

    fn soft_delete_as<E: Entity>(&self, id: RecordId) -> DispatchResult<()> {
        let scope = self.repo.begin_write()?;
        let mut entity = self.load::<E>(id)?;
        entity.mark_deleted(Utc::now().naive_utc());
        self.repo.save(&entity)?;
        scope.commit()?;
        Ok(())
    }

    fn load<E: Entity>(&self, id: RecordId) -> DispatchResult<E> {
        self.repo
            .find_by_id::<E>(id)?
            .ok_or(DispatchError::NotFound {
                entity: E::KIND,
                id,
            })
    }
}

fn assign_checked<E: Entity>(
    entity: &mut E,
    field: &'static str,
    value: FieldValue,
) -> DispatchResult<()> {
    if entity.assign(field, value) {
        return Ok(());
    }
    Err(DispatchError::Store(RepoError::InvalidData(format!(
        "{} rejected a value for `{field}`",
        E::KIND
    ))))
}

fn log_outcome<T>(
    event: &str,
    model: &str,
    id: Option<RecordId>,
    result: &DispatchResult<T>,
    started_at: Instant,
) {
    let entity = EntityKind::resolve(model).map_or("unknown", EntityKind::as_str);
    let id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match result {
        Ok(_) => info!(
            "event={} module=dispatcher status=ok entity={} id={} duration_ms={}",
            event,
            entity,
            id,
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={} module=dispatcher status=error entity={} id={} duration_ms={} error_code={}",
            event,
            entity,
            id,
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
}
