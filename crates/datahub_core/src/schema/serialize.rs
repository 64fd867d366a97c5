use super::{EntityKind, FieldKind, Record, RecordId};
use crate::model::Entity;
use crate::repo::RepoResult;
use serde_json::Value;

/// Looks up the display name of a linked row at serialization time.
pub trait LinkResolver {
    /// Returns `None` when the target row is missing or not visible.
    fn display_name(&mut self, target: EntityKind, id: RecordId) -> RepoResult<Option<String>>;
}

/// Builds the external representation of an entity.
///
/// The map holds `id` plus every schema field in declaration order. Foreign
/// keys also emit their label key with the linked row's display name.
pub fn serialize<E: Entity>(entity: &E, links: &mut dyn LinkResolver) -> RepoResult<Record> {
    let schema = E::KIND.schema();
    let mut record = Record::new();
    record.insert("id".to_string(), entity.id().map_or(Value::Null, Value::from));

    for spec in schema.fields {
        let value = entity
            .field(spec.name)
            .map_or(Value::Null, |value| value.to_json());

        if let FieldKind::ForeignKey { target, label } = spec.kind {
            let name = match value.as_i64() {
                Some(id) => links.display_name(target, id)?,
                None => None,
            };
            record.insert(label.to_string(), name.map_or(Value::Null, Value::String));
        }

        record.insert(spec.name.to_string(), value);
    }

    Ok(record)
}
