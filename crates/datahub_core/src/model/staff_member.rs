//! Staff member (`usuarios`).

use super::{Entity, SoftDeletable, SoftDeleteState};
use crate::schema::{EntityKind, FieldValue, RecordId};
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffMember {
    pub id: Option<RecordId>,
    pub name: String,
    pub role: Option<String>,
    pub department: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub visibility: SoftDeleteState,
}

impl SoftDeletable for StaffMember {
    fn soft_delete_state(&self) -> &SoftDeleteState {
        &self.visibility
    }

    fn soft_delete_state_mut(&mut self) -> &mut SoftDeleteState {
        &mut self.visibility
    }
}

impl Entity for StaffMember {
    const KIND: EntityKind = EntityKind::Usuarios;

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "nombre" => Some(FieldValue::Text(Some(self.name.clone()))),
            "cargo" => Some(FieldValue::Text(self.role.clone())),
            "departamento" => Some(FieldValue::Text(self.department.clone())),
            "fecha_ingreso" => Some(FieldValue::Date(self.hire_date)),
            _ => None,
        }
    }

    fn assign(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("nombre", FieldValue::Text(Some(value))) => self.name = value,
            ("cargo", FieldValue::Text(value)) => self.role = value,
            ("departamento", FieldValue::Text(value)) => self.department = value,
            ("fecha_ingreso", FieldValue::Date(value)) => self.hire_date = value,
            _ => return false,
        }
        true
    }
}
