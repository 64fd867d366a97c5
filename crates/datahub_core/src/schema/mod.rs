//! Entity schema registry.
//!
//! # Responsibility
//! - Map the four entity-name tokens to their table, field set and field kinds.
//! - Provide the external (API) representation of any entity.
//!
//! # Invariants
//! - Tokens are matched exactly; there is no case folding or aliasing.
//! - Field order in a schema is the column order used for writes and reads.
//! - Date-typed fields are exactly the fields whose name carries
//!   [`DATE_KEYWORD`].

use chrono::NaiveDate;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod coerce;
mod serialize;

pub use serialize::{serialize, LinkResolver};

/// Store-assigned surrogate key shared by every entity.
pub type RecordId = i64;

/// Flat key/value external representation of one entity.
pub type Record = serde_json::Map<String, Value>;

/// Name fragment marking date-typed fields in every schema.
pub const DATE_KEYWORD: &str = "fecha";

/// The four registered entity kinds, keyed by their wire token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Generic data record (`datos`).
    Datos,
    /// Staff member (`usuarios`).
    Usuarios,
    /// Company (`empresas`).
    Empresas,
    /// Project (`proyectos`).
    Proyectos,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Datos,
        EntityKind::Usuarios,
        EntityKind::Empresas,
        EntityKind::Proyectos,
    ];

    /// Resolves a caller-supplied token into a registered kind.
    pub fn resolve(name: &str) -> Result<Self, UnknownEntity> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| UnknownEntity(name.to_string()))
    }

    pub fn as_str(self) -> &'static str {
        self.schema().token
    }

    pub fn schema(self) -> &'static EntitySchema {
        match self {
            Self::Datos => &DATOS,
            Self::Usuarios => &USUARIOS,
            Self::Empresas => &EMPRESAS,
            Self::Proyectos => &PROYECTOS,
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownEntity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

/// Token that does not name a registered entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntity(pub String);

impl Display for UnknownEntity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown model `{}`; expected datos|usuarios|empresas|proyectos",
            self.0
        )
    }
}

impl Error for UnknownEntity {}

/// Declared type of one entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Nullable string.
    Text,
    /// Non-null string; must be present on create.
    RequiredText,
    /// Nullable 64-bit integer.
    Integer,
    /// Nullable calendar date, `YYYY-MM-DD` on the wire.
    Date,
    /// Nullable reference to another entity's `id`.
    ///
    /// `label` is the extra serialized key carrying the referenced row's
    /// display name.
    ForeignKey {
        target: EntityKind,
        label: &'static str,
    },
}

impl FieldKind {
    /// Human-readable description used in validation errors.
    pub fn expected(self) -> &'static str {
        match self {
            Self::Text => "string or null",
            Self::RequiredText => "non-null string",
            Self::Integer => "integer or null",
            Self::Date => "YYYY-MM-DD date or null",
            Self::ForeignKey { .. } => "integer id or null",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }

    pub fn is_required(&self) -> bool {
        matches!(self.kind, FieldKind::RequiredText)
    }
}

/// Static description of one entity shape.
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Wire token accepted in `/api/{model}`.
    pub token: &'static str,
    pub table: &'static str,
    /// Writable fields, excluding `id` and the soft-delete pair.
    pub fields: &'static [FieldSpec],
    /// Field rendered when another entity links to this one.
    pub display_field: &'static str,
}

impl EntitySchema {
    /// Looks a field up in this entity's whitelist.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }
}

static DATOS: EntitySchema = EntitySchema {
    kind: EntityKind::Datos,
    token: "datos",
    table: "datos",
    fields: &[
        FieldSpec::new("nombre", FieldKind::RequiredText),
        FieldSpec::new("email", FieldKind::RequiredText),
        FieldSpec::new("fecha", FieldKind::Date),
    ],
    display_field: "nombre",
};

static USUARIOS: EntitySchema = EntitySchema {
    kind: EntityKind::Usuarios,
    token: "usuarios",
    table: "usuarios",
    fields: &[
        FieldSpec::new("nombre", FieldKind::RequiredText),
        FieldSpec::new("cargo", FieldKind::Text),
        FieldSpec::new("departamento", FieldKind::Text),
        FieldSpec::new("fecha_ingreso", FieldKind::Date),
    ],
    display_field: "nombre",
};

static EMPRESAS: EntitySchema = EntitySchema {
    kind: EntityKind::Empresas,
    token: "empresas",
    table: "empresas",
    fields: &[
        FieldSpec::new("nombre", FieldKind::RequiredText),
        FieldSpec::new("sector", FieldKind::Text),
        FieldSpec::new("ubicacion", FieldKind::Text),
        FieldSpec::new("empleados", FieldKind::Integer),
    ],
    display_field: "nombre",
};

static PROYECTOS: EntitySchema = EntitySchema {
    kind: EntityKind::Proyectos,
    token: "proyectos",
    table: "proyectos",
    fields: &[
        FieldSpec::new("nombre", FieldKind::RequiredText),
        FieldSpec::new("estado", FieldKind::Text),
        FieldSpec::new("fecha_inicio", FieldKind::Date),
        FieldSpec::new("fecha_fin", FieldKind::Date),
        FieldSpec::new(
            "empresa_id",
            FieldKind::ForeignKey {
                target: EntityKind::Empresas,
                label: "cliente",
            },
        ),
    ],
    display_field: "nombre",
};

/// Typed value of one field, as stored on an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    Integer(Option<i64>),
    Date(Option<NaiveDate>),
}

impl FieldValue {
    /// Renders the value in its external JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(value) => value.clone().map_or(Value::Null, Value::String),
            Self::Integer(value) => value.map_or(Value::Null, Value::from),
            Self::Date(value) => value.map_or(Value::Null, |date| {
                Value::String(date.format(coerce::ISO_DATE_FORMAT).to_string())
            }),
        }
    }
}
