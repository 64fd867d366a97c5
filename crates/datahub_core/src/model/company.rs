//! Company (`empresas`).
//!
//! Projects point at companies through `proyectos.empresa_id`; deleting a
//! company never touches its projects.

use super::{Entity, SoftDeletable, SoftDeleteState};
use crate::schema::{EntityKind, FieldValue, RecordId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Company {
    pub id: Option<RecordId>,
    pub name: String,
    pub sector: Option<String>,
    pub location: Option<String>,
    pub employees: Option<i64>,
    pub visibility: SoftDeleteState,
}

impl SoftDeletable for Company {
    fn soft_delete_state(&self) -> &SoftDeleteState {
        &self.visibility
    }

    fn soft_delete_state_mut(&mut self) -> &mut SoftDeleteState {
        &mut self.visibility
    }
}

impl Entity for Company {
    const KIND: EntityKind = EntityKind::Empresas;

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "nombre" => Some(FieldValue::Text(Some(self.name.clone()))),
            "sector" => Some(FieldValue::Text(self.sector.clone())),
            "ubicacion" => Some(FieldValue::Text(self.location.clone())),
            "empleados" => Some(FieldValue::Integer(self.employees)),
            _ => None,
        }
    }

    fn assign(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("nombre", FieldValue::Text(Some(value))) => self.name = value,
            ("sector", FieldValue::Text(value)) => self.sector = value,
            ("ubicacion", FieldValue::Text(value)) => self.location = value,
            ("empleados", FieldValue::Integer(value)) => self.employees = value,
            _ => return false,
        }
        true
    }
}
