//! Generic data record (`datos`).
//!
//! # Invariants
//! - `email` is unique across every row, deleted ones included; the store
//!   enforces it.

use super::{Entity, SoftDeletable, SoftDeleteState};
use crate::schema::{EntityKind, FieldValue, RecordId};
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericRecord {
    pub id: Option<RecordId>,
    pub name: String,
    pub email: String,
    pub date: Option<NaiveDate>,
    pub visibility: SoftDeleteState,
}

impl SoftDeletable for GenericRecord {
    fn soft_delete_state(&self) -> &SoftDeleteState {
        &self.visibility
    }

    fn soft_delete_state_mut(&mut self) -> &mut SoftDeleteState {
        &mut self.visibility
    }
}

impl Entity for GenericRecord {
    const KIND: EntityKind = EntityKind::Datos;

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "nombre" => Some(FieldValue::Text(Some(self.name.clone()))),
            "email" => Some(FieldValue::Text(Some(self.email.clone()))),
            "fecha" => Some(FieldValue::Date(self.date)),
            _ => None,
        }
    }

    fn assign(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("nombre", FieldValue::Text(Some(value))) => self.name = value,
            ("email", FieldValue::Text(Some(value))) => self.email = value,
            ("fecha", FieldValue::Date(value)) => self.date = value,
            _ => return false,
        }
        true
    }
}
