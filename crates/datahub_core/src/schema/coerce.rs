//! Request value coercion against a field's declared kind.
//!
//! # Invariants
//! - Dates are accepted only in strict `YYYY-MM-DD` form.
//! - Every non-date field is type-checked; nothing is stored as-is.

use super::{FieldKind, FieldSpec, FieldValue};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// `chrono` format used for dates on the wire and in the store.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));

/// Which operation the value arrives with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionMode {
    /// Create: absent or blank dates become null, required fields must exist.
    Create,
    /// Update: only keys present in the request are touched.
    Update,
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Required field absent (or null) on create.
    Missing { field: &'static str },
    /// Date field whose value is not a valid `YYYY-MM-DD` date.
    InvalidDate { field: &'static str, value: String },
    /// Value of the wrong JSON type for the field.
    InvalidValue {
        field: &'static str,
        expected: &'static str,
    },
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { field } => write!(f, "missing required field `{field}`"),
            Self::InvalidDate { field, value } => {
                write!(f, "invalid date `{value}` for `{field}`; expected YYYY-MM-DD")
            }
            Self::InvalidValue { field, expected } => {
                write!(f, "invalid value for `{field}`; expected {expected}")
            }
        }
    }
}

impl Error for FieldError {}

/// Parses a strict ISO calendar date.
///
/// Returns `None` for anything but zero-padded `YYYY-MM-DD` naming a real day.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    if !ISO_DATE_RE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).ok()
}

/// Coerces one raw request value into the field's typed value.
///
/// `raw` is `None` when the key is absent from the request.
pub fn coerce_field(
    spec: &FieldSpec,
    raw: Option<&Value>,
    mode: CoercionMode,
) -> Result<FieldValue, FieldError> {
    let raw = raw.unwrap_or(&Value::Null);
    let invalid = || FieldError::InvalidValue {
        field: spec.name,
        expected: spec.kind.expected(),
    };

    match spec.kind {
        FieldKind::RequiredText => match raw {
            Value::String(text) => Ok(FieldValue::Text(Some(text.clone()))),
            Value::Null if mode == CoercionMode::Create => {
                Err(FieldError::Missing { field: spec.name })
            }
            _ => Err(invalid()),
        },
        FieldKind::Text => match raw {
            Value::String(text) => Ok(FieldValue::Text(Some(text.clone()))),
            Value::Null => Ok(FieldValue::Text(None)),
            _ => Err(invalid()),
        },
        FieldKind::Integer | FieldKind::ForeignKey { .. } => match raw {
            Value::Number(number) => number
                .as_i64()
                .map(|n| FieldValue::Integer(Some(n)))
                .ok_or_else(invalid),
            Value::Null => Ok(FieldValue::Integer(None)),
            _ => Err(invalid()),
        },
        FieldKind::Date => match raw {
            Value::Null => Ok(FieldValue::Date(None)),
            Value::String(text) if text.is_empty() && mode == CoercionMode::Create => {
                Ok(FieldValue::Date(None))
            }
            Value::String(text) => parse_iso_date(text)
                .map(|date| FieldValue::Date(Some(date)))
                .ok_or_else(|| FieldError::InvalidDate {
                    field: spec.name,
                    value: text.clone(),
                }),
            other => Err(FieldError::InvalidDate {
                field: spec.name,
                value: other.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{coerce_field, parse_iso_date, CoercionMode, FieldError};
    use crate::schema::{EntityKind, FieldValue};
    use chrono::NaiveDate;
    use serde_json::json;

    fn spec(kind: EntityKind, name: &str) -> &'static crate::schema::FieldSpec {
        kind.schema().field(name).expect("field should exist")
    }

    #[test]
    fn parse_iso_date_is_strict() {
        assert_eq!(
            parse_iso_date("2024-01-31"),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(parse_iso_date("2024-1-31"), None);
        assert_eq!(parse_iso_date("31/01/2024"), None);
        assert_eq!(parse_iso_date("2024-02-30"), None);
        assert_eq!(parse_iso_date("2024-01-31T00:00:00"), None);
    }

    #[test]
    fn blank_date_is_null_on_create_but_invalid_on_update() {
        let fecha = spec(EntityKind::Datos, "fecha");
        let blank = json!("");

        assert_eq!(
            coerce_field(fecha, Some(&blank), CoercionMode::Create).unwrap(),
            FieldValue::Date(None)
        );
        assert!(matches!(
            coerce_field(fecha, Some(&blank), CoercionMode::Update),
            Err(FieldError::InvalidDate { field: "fecha", .. })
        ));
    }

    #[test]
    fn null_date_clears_the_field() {
        let fecha_fin = spec(EntityKind::Proyectos, "fecha_fin");
        assert_eq!(
            coerce_field(fecha_fin, Some(&json!(null)), CoercionMode::Update).unwrap(),
            FieldValue::Date(None)
        );
    }

    #[test]
    fn required_text_missing_only_on_create() {
        let nombre = spec(EntityKind::Empresas, "nombre");

        assert_eq!(
            coerce_field(nombre, None, CoercionMode::Create),
            Err(FieldError::Missing { field: "nombre" })
        );
        assert!(matches!(
            coerce_field(nombre, Some(&json!(null)), CoercionMode::Update),
            Err(FieldError::InvalidValue { field: "nombre", .. })
        ));
    }

    #[test]
    fn integer_fields_reject_strings_and_fractions() {
        let empleados = spec(EntityKind::Empresas, "empleados");

        assert_eq!(
            coerce_field(empleados, Some(&json!(120)), CoercionMode::Update).unwrap(),
            FieldValue::Integer(Some(120))
        );
        assert!(coerce_field(empleados, Some(&json!("120")), CoercionMode::Update).is_err());
        assert!(coerce_field(empleados, Some(&json!(12.5)), CoercionMode::Update).is_err());
    }

    #[test]
    fn text_fields_reject_non_strings() {
        let cargo = spec(EntityKind::Usuarios, "cargo");
        assert!(matches!(
            coerce_field(cargo, Some(&json!(["x"])), CoercionMode::Create),
            Err(FieldError::InvalidValue { field: "cargo", .. })
        ));
    }
}
