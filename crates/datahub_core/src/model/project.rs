//! Project (`proyectos`).

use super::{Entity, SoftDeletable, SoftDeleteState};
use crate::schema::{EntityKind, FieldValue, RecordId};
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub id: Option<RecordId>,
    pub name: String,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Owning company; must reference an existing `empresas.id` when set.
    pub company_id: Option<RecordId>,
    pub visibility: SoftDeleteState,
}

impl SoftDeletable for Project {
    fn soft_delete_state(&self) -> &SoftDeleteState {
        &self.visibility
    }

    fn soft_delete_state_mut(&mut self) -> &mut SoftDeleteState {
        &mut self.visibility
    }
}

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Proyectos;

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "nombre" => Some(FieldValue::Text(Some(self.name.clone()))),
            "estado" => Some(FieldValue::Text(self.status.clone())),
            "fecha_inicio" => Some(FieldValue::Date(self.start_date)),
            "fecha_fin" => Some(FieldValue::Date(self.end_date)),
            "empresa_id" => Some(FieldValue::Integer(self.company_id)),
            _ => None,
        }
    }

    fn assign(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("nombre", FieldValue::Text(Some(value))) => self.name = value,
            ("estado", FieldValue::Text(value)) => self.status = value,
            ("fecha_inicio", FieldValue::Date(value)) => self.start_date = value,
            ("fecha_fin", FieldValue::Date(value)) => self.end_date = value,
            ("empresa_id", FieldValue::Integer(value)) => self.company_id = value,
            _ => return false,
        }
        true
    }
}
