use datahub_core::db::open_db_in_memory;
use datahub_core::{
    DispatchError, Dispatcher, EntityKind, EntityRepository, FieldMap, GenericRecord, Record,
    SoftDeletable, SqliteEntityRepository,
};
use rusqlite::Connection;
use serde_json::{json, Value};

fn dispatcher(conn: &Connection) -> Dispatcher<SqliteEntityRepository<'_>> {
    Dispatcher::new(SqliteEntityRepository::try_new(conn).unwrap())
}

fn fields(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

fn ids(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .map(|record| record["id"].as_i64().unwrap())
        .collect()
}

fn created_id(record: &Record) -> i64 {
    record["id"].as_i64().unwrap()
}

#[test]
fn created_row_is_listed_until_soft_deleted() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let kept = dispatcher
        .create("usuarios", &fields(json!({"nombre": "Ana García"})))
        .unwrap();
    let removed = dispatcher
        .create("usuarios", &fields(json!({"nombre": "Juan López"})))
        .unwrap();

    let listed = dispatcher.read_all("usuarios").unwrap();
    assert_eq!(ids(&listed), vec![created_id(&kept), created_id(&removed)]);

    dispatcher
        .soft_delete("usuarios", created_id(&removed))
        .unwrap();

    let listed = dispatcher.read_all("usuarios").unwrap();
    assert_eq!(ids(&listed), vec![created_id(&kept)]);
}

#[test]
fn soft_delete_is_idempotent_and_keeps_the_row() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);
    let repo = SqliteEntityRepository::new(&conn);

    let created = dispatcher
        .create(
            "datos",
            &fields(json!({"nombre": "Dato 1", "email": "dato1@ejemplo.com"})),
        )
        .unwrap();
    let id = created_id(&created);

    dispatcher.soft_delete("datos", id).unwrap();
    let first = repo.find_by_id::<GenericRecord>(id).unwrap().unwrap();
    assert!(first.is_deleted());
    let first_at = first.deleted_at().unwrap();

    dispatcher.soft_delete("datos", id).unwrap();
    let second = repo.find_by_id::<GenericRecord>(id).unwrap().unwrap();
    assert!(second.is_deleted());
    assert!(second.deleted_at().unwrap() >= first_at);

    let (is_deleted, deleted_at): (i64, Option<String>) = conn
        .query_row(
            "SELECT is_deleted, deleted_at FROM datos WHERE id = ?1;",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(is_deleted, 1);
    assert!(deleted_at.is_some());
}

#[test]
fn update_ignores_unknown_keys_and_applies_known_ones() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let created = dispatcher
        .create(
            "empresas",
            &fields(json!({"nombre": "DataSys SL", "sector": "Software", "empleados": 50})),
        )
        .unwrap();
    let id = created_id(&created);

    dispatcher
        .update(
            "empresas",
            id,
            &fields(json!({
                "empleados": 75,
                "ubicacion": "Bilbao",
                "no_such_field": "ignored",
                "id": 999,
                "is_deleted": true
            })),
        )
        .unwrap();

    let listed = dispatcher.read_all("empresas").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], json!(id));
    assert_eq!(listed[0]["empleados"], json!(75));
    assert_eq!(listed[0]["ubicacion"], json!("Bilbao"));
    assert_eq!(listed[0]["sector"], json!("Software"));
    assert!(listed[0].get("no_such_field").is_none());
}

#[test]
fn update_rejects_malformed_dates_without_applying_anything() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let created = dispatcher
        .create(
            "usuarios",
            &fields(json!({"nombre": "Laura Pérez", "fecha_ingreso": "2023-03-01"})),
        )
        .unwrap();
    let id = created_id(&created);

    let err = dispatcher
        .update(
            "usuarios",
            id,
            &fields(json!({"cargo": "QA Engineer", "fecha_ingreso": "01/03/2023"})),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::InvalidDate {
            field: "fecha_ingreso",
            ..
        }
    ));

    let listed = dispatcher.read_all("usuarios").unwrap();
    assert_eq!(listed[0]["cargo"], Value::Null);
    assert_eq!(listed[0]["fecha_ingreso"], json!("2023-03-01"));
}

#[test]
fn update_type_checks_non_date_fields() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let created = dispatcher
        .create("empresas", &fields(json!({"nombre": "CloudTech"})))
        .unwrap();

    let err = dispatcher
        .update(
            "empresas",
            created_id(&created),
            &fields(json!({"empleados": "muchos"})),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::InvalidValue {
            field: "empleados",
            ..
        }
    ));

    let err = dispatcher
        .update(
            "empresas",
            created_id(&created),
            &fields(json!({"nombre": null})),
        )
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidValue { field: "nombre", .. }));
}

#[test]
fn update_null_date_clears_it() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let created = dispatcher
        .create(
            "proyectos",
            &fields(json!({"nombre": "API REST 4", "fecha_fin": "2024-12-31"})),
        )
        .unwrap();

    dispatcher
        .update(
            "proyectos",
            created_id(&created),
            &fields(json!({"fecha_fin": null})),
        )
        .unwrap();

    let listed = dispatcher.read_all("proyectos").unwrap();
    assert_eq!(listed[0]["fecha_fin"], Value::Null);
}

#[test]
fn update_and_delete_of_missing_id_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let err = dispatcher
        .update("datos", 999, &fields(json!({"nombre": "x"})))
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::NotFound {
            entity: EntityKind::Datos,
            id: 999
        }
    ));

    let err = dispatcher.soft_delete("datos", 999).unwrap_err();
    assert!(matches!(err, DispatchError::NotFound { id: 999, .. }));
    assert!(matches!(
        dispatcher.require_row("datos", 999),
        Err(DispatchError::NotFound { .. })
    ));
}

#[test]
fn soft_deleted_row_can_still_be_updated_but_stays_hidden() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let created = dispatcher
        .create("usuarios", &fields(json!({"nombre": "Pedro Sánchez"})))
        .unwrap();
    let id = created_id(&created);
    dispatcher.soft_delete("usuarios", id).unwrap();

    dispatcher.require_row("usuarios", id).unwrap();
    dispatcher
        .update("usuarios", id, &fields(json!({"cargo": "Scrum Master"})))
        .unwrap();

    assert!(dispatcher.read_all("usuarios").unwrap().is_empty());
}

#[test]
fn duplicate_email_is_rejected_even_after_soft_delete() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);
    let body = fields(json!({"nombre": "Dato 2", "email": "dato2@ejemplo.com"}));

    let first = dispatcher.create("datos", &body).unwrap();
    let err = dispatcher.create("datos", &body).unwrap_err();
    assert!(matches!(err, DispatchError::ConstraintViolation(_)));

    dispatcher.soft_delete("datos", created_id(&first)).unwrap();
    let err = dispatcher.create("datos", &body).unwrap_err();
    assert!(matches!(err, DispatchError::ConstraintViolation(_)));

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM datos;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 1);
}

#[test]
fn create_requires_required_fields_and_leaves_no_row_on_failure() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let err = dispatcher
        .create("datos", &fields(json!({"nombre": "Sin email"})))
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::MissingField {
            entity: EntityKind::Datos,
            field: "email"
        }
    ));

    let err = dispatcher
        .create(
            "datos",
            &fields(json!({"nombre": "Dato", "email": "a@b.c", "fecha": "2024-13-01"})),
        )
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidDate { field: "fecha", .. }));

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM datos;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 0);
}

#[test]
fn create_treats_blank_dates_as_absent() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let created = dispatcher
        .create(
            "datos",
            &fields(json!({"nombre": "Dato 3", "email": "dato3@ejemplo.com", "fecha": ""})),
        )
        .unwrap();
    assert_eq!(created["fecha"], Value::Null);
}

#[test]
fn unknown_model_is_rejected_by_every_operation() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);
    let body = fields(json!({"nombre": "x"}));

    assert!(matches!(
        dispatcher.read_all("noexiste"),
        Err(DispatchError::UnknownEntity(name)) if name == "noexiste"
    ));
    assert!(matches!(
        dispatcher.create("noexiste", &body),
        Err(DispatchError::UnknownEntity(_))
    ));
    assert!(matches!(
        dispatcher.update("noexiste", 1, &body),
        Err(DispatchError::UnknownEntity(_))
    ));
    assert!(matches!(
        dispatcher.soft_delete("noexiste", 1),
        Err(DispatchError::UnknownEntity(_))
    ));
}

#[test]
fn created_fields_round_trip_through_read_all() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let company = dispatcher
        .create(
            "empresas",
            &fields(json!({
                "nombre": "TechSolutions SA",
                "sector": "Fintech",
                "ubicacion": "Madrid",
                "empleados": 320
            })),
        )
        .unwrap();
    let company_id = created_id(&company);

    let inputs = [
        (
            "datos",
            json!({"nombre": "Dato 4", "email": "dato4@ejemplo.com", "fecha": "2024-02-29"}),
        ),
        (
            "usuarios",
            json!({
                "nombre": "Sofia Martínez",
                "cargo": "Diseñador UX",
                "departamento": "Diseño",
                "fecha_ingreso": "2022-09-15"
            }),
        ),
        (
            "proyectos",
            json!({
                "nombre": "Portal Web 12",
                "estado": "Planificación",
                "fecha_inicio": "2024-01-01",
                "fecha_fin": "2024-06-01",
                "empresa_id": company_id
            }),
        ),
    ];

    for (model, input) in inputs {
        let input = fields(input);
        let created = dispatcher.create(model, &input).unwrap();
        let listed = dispatcher.read_all(model).unwrap();
        let entry = listed
            .iter()
            .find(|record| record["id"] == created["id"])
            .unwrap();

        for (key, value) in &input {
            assert_eq!(&entry[key], value, "{model}.{key} did not round-trip");
        }
        assert_eq!(entry, &created);
    }
}

#[test]
fn project_listing_carries_visible_company_name() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let mut company_id = 0;
    for n in 1..=7 {
        let company = dispatcher
            .create("empresas", &fields(json!({"nombre": format!("Empresa {n}")})))
            .unwrap();
        company_id = created_id(&company);
    }
    assert_eq!(company_id, 7);

    dispatcher
        .create(
            "proyectos",
            &fields(json!({
                "nombre": "X",
                "estado": "En Progreso",
                "fecha_inicio": "2024-01-01",
                "fecha_fin": "2024-06-01",
                "empresa_id": 7
            })),
        )
        .unwrap();
    dispatcher
        .create("proyectos", &fields(json!({"nombre": "Sin cliente"})))
        .unwrap();

    let listed = dispatcher.read_all("proyectos").unwrap();
    assert_eq!(listed[0]["cliente"], json!("Empresa 7"));
    assert_eq!(listed[1]["cliente"], Value::Null);

    dispatcher.soft_delete("empresas", 7).unwrap();
    let listed = dispatcher.read_all("proyectos").unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["cliente"], Value::Null);
    assert_eq!(listed[0]["empresa_id"], json!(7));
}

#[test]
fn project_with_unknown_company_is_a_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let dispatcher = dispatcher(&conn);

    let err = dispatcher
        .create(
            "proyectos",
            &fields(json!({"nombre": "Huérfano", "empresa_id": 42})),
        )
        .unwrap_err();
    assert!(matches!(err, DispatchError::ConstraintViolation(_)));
    assert!(dispatcher.read_all("proyectos").unwrap().is_empty());
}
