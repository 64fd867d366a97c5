//! HTTP surface for the datahub record store.
//!
//! # Responsibility
//! - Map `/api/{model}` routes onto the generic dispatcher.
//! - Translate dispatcher outcomes into status codes and JSON envelopes.
//!
//! # Invariants
//! - One dispatcher operation runs per lock acquisition of the shared session.
//! - PUT checks the row exists before the body is parsed.

pub mod error;
mod request_log;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{middleware, Json, Router};
use datahub_core::{
    core_version, ping, Dispatcher, FieldMap, Record, RecordId, SqliteEntityRepository,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

pub use error::ApiError;

const CREATED_MESSAGE: &str = "Registro creado exitosamente";
const UPDATED_MESSAGE: &str = "Registro actualizado exitosamente";
const DELETED_MESSAGE: &str = "Registro eliminado exitosamente";

/// Shared state: the single store session behind a mutex.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Wraps a connection opened through `datahub_core::db::open_db*`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn session(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.conn.lock().map_err(|_| ApiError::StoreUnavailable)
    }
}

#[derive(Serialize)]
struct ListBody {
    data: Vec<Record>,
}

#[derive(Serialize)]
struct MessageBody {
    mensaje: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Record>,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    version: &'static str,
}

/// Build the HTTP router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/{model}", get(list_records).post(create_record))
        .route(
            "/api/{model}/{id}",
            put(update_record).delete(delete_record),
        )
        .layer(middleware::from_fn(request_log::log_request))
        .with_state(state)
}

/// Serves the router on an already-bound listener until the server stops.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state)).await
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: ping(),
        version: core_version(),
    })
}

async fn list_records(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> Result<Json<ListBody>, ApiError> {
    let conn = state.session()?;
    let data = Dispatcher::new(SqliteEntityRepository::new(&conn)).read_all(&model)?;
    Ok(Json(ListBody { data }))
}

async fn create_record(
    State(state): State<AppState>,
    Path(model): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let fields = parse_fields(&body)?;
    let conn = state.session()?;
    let record = Dispatcher::new(SqliteEntityRepository::new(&conn)).create(&model, &fields)?;
    Ok((
        StatusCode::CREATED,
        Json(MessageBody {
            mensaje: CREATED_MESSAGE,
            data: Some(record),
        }),
    ))
}

async fn update_record(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<MessageBody>, ApiError> {
    let id = parse_id(&model, &id)?;
    let conn = state.session()?;
    let dispatcher = Dispatcher::new(SqliteEntityRepository::new(&conn));

    dispatcher.require_row(&model, id)?;
    let fields = parse_fields(&body)?;
    dispatcher.update(&model, id, &fields)?;

    Ok(Json(MessageBody {
        mensaje: UPDATED_MESSAGE,
        data: None,
    }))
}

async fn delete_record(
    State(state): State<AppState>,
    Path((model, id)): Path<(String, String)>,
) -> Result<Json<MessageBody>, ApiError> {
    let id = parse_id(&model, &id)?;
    let conn = state.session()?;
    Dispatcher::new(SqliteEntityRepository::new(&conn)).soft_delete(&model, id)?;

    Ok(Json(MessageBody {
        mensaje: DELETED_MESSAGE,
        data: None,
    }))
}

fn parse_id(model: &str, raw: &str) -> Result<RecordId, ApiError> {
    raw.parse::<RecordId>()
        .map_err(|_| ApiError::NoSuchResource(format!("/api/{model}/{raw}")))
}

fn parse_fields(body: &[u8]) -> Result<FieldMap, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::MalformedBody(
            "expected a JSON object".to_string(),
        )),
        Err(err) => Err(ApiError::MalformedBody(err.to_string())),
    }
}
